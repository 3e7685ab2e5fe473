//! Proximity-based candidate matching.
//!
//! Exact sticker identity cannot be read off a photo, so closeness to an
//! existing placement of the same design stands in for "same physical
//! sticker", with the end user as final arbiter. Candidates are served
//! closest-first for disambiguation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use pastetrail_common::{Point, Result};

use crate::geo::{bounding_box, haversine_distance_meters};
use crate::stickers::Sticker;

/// A nearby placement of the requested design, annotated with what the
/// disambiguation view shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyCandidate {
    pub sticker: Sticker,
    pub distance_meters: f64,
    pub sighting_count: i64,
    pub photo_uri: Option<String>,
}

/// Stickers of `design_id` within `threshold_meters` of `origin`, sorted by
/// non-decreasing distance. An empty result is a normal outcome.
pub async fn find_nearby_stickers(
    design_id: Uuid,
    origin: Point,
    threshold_meters: f64,
    pool: &PgPool,
) -> Result<Vec<NearbyCandidate>> {
    let ranked = nearby_raw(design_id, origin, threshold_meters, pool).await?;
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = ranked.iter().map(|(s, _)| s.id).collect();

    let counts: HashMap<Uuid, i64> = sqlx::query_as::<_, (Uuid, i64)>(
        "SELECT sticker_id, COUNT(*) FROM sightings WHERE sticker_id = ANY($1) GROUP BY sticker_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let photos: HashMap<Uuid, String> = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT DISTINCT ON (sticker_id) sticker_id, photo_uri
        FROM sightings
        WHERE sticker_id = ANY($1)
        ORDER BY sticker_id, logged_at ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    Ok(ranked
        .into_iter()
        .map(|(sticker, distance_meters)| {
            let sighting_count = counts.get(&sticker.id).copied().unwrap_or(0);
            let photo_uri = photos.get(&sticker.id).cloned();
            NearbyCandidate {
                sticker,
                distance_meters,
                sighting_count,
                photo_uri,
            }
        })
        .collect())
}

/// The bare ranked match: bounding-box pre-filter in SQL, exact haversine
/// in Rust. Generic over the executor so the sticker-creation guard can run
/// it inside its transaction.
pub(crate) async fn nearby_raw<'e, E>(
    design_id: Uuid,
    origin: Point,
    threshold_meters: f64,
    executor: E,
) -> Result<Vec<(Sticker, f64)>>
where
    E: sqlx::PgExecutor<'e>,
{
    let (lat_min, lat_max, lng_min, lng_max) = bounding_box(origin, threshold_meters);

    let stickers = sqlx::query_as::<_, Sticker>(
        r#"
        SELECT * FROM stickers
        WHERE design_id = $1
          AND latitude BETWEEN $2 AND $3
          AND longitude BETWEEN $4 AND $5
        "#,
    )
    .bind(design_id)
    .bind(lat_min)
    .bind(lat_max)
    .bind(lng_min)
    .bind(lng_max)
    .fetch_all(executor)
    .await?;

    Ok(filter_and_rank(origin, threshold_meters, stickers))
}

/// Retain stickers within the threshold and sort closest-first.
fn filter_and_rank(
    origin: Point,
    threshold_meters: f64,
    stickers: Vec<Sticker>,
) -> Vec<(Sticker, f64)> {
    let mut ranked: Vec<(Sticker, f64)> = stickers
        .into_iter()
        .map(|s| {
            let d = haversine_distance_meters(origin, s.location());
            (s, d)
        })
        .filter(|(_, d)| *d <= threshold_meters)
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sticker_at(latitude: f64, longitude: f64) -> Sticker {
        Sticker {
            id: Uuid::new_v4(),
            design_id: Uuid::new_v4(),
            latitude,
            longitude,
            location_description: String::new(),
            geo_cell: crate::geo::placement_cell(Point::new(latitude, longitude)),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ranks_closest_first() {
        let origin = Point::new(40.7081, -73.9571);
        let near = sticker_at(40.7082, -73.9572);
        let nearer = sticker_at(40.70811, -73.95711);
        let ranked = filter_and_rank(origin, 200.0, vec![near.clone(), nearer.clone()]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0.id, nearer.id);
        assert_eq!(ranked[1].0.id, near.id);
        assert!(ranked[0].1 <= ranked[1].1);
    }

    #[test]
    fn drops_stickers_past_threshold() {
        let origin = Point::new(40.7081, -73.9571);
        let near = sticker_at(40.7082, -73.9572);
        let far = sticker_at(40.7484, -73.9857);
        let ranked = filter_and_rank(origin, 200.0, vec![far, near.clone()]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0.id, near.id);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let origin = Point::new(40.71, -73.97);
        assert!(filter_and_rank(origin, 200.0, Vec::new()).is_empty());
    }
}
