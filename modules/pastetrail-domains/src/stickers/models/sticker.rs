use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use pastetrail_common::{Error, Point, Result};

use crate::geo;
use crate::matching;

/// One physical placement of a design. Location is fixed at creation; later
/// sightings never move it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sticker {
    pub id: Uuid,
    pub design_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub location_description: String,
    pub geo_cell: String,
    pub created_at: DateTime<Utc>,
}

/// Sticker annotated with design name and sighting aggregate (detail views).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StickerDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub sticker: Sticker,
    pub design_name: String,
    pub sighting_count: i64,
    pub photo_uri: Option<String>,
}

impl Sticker {
    /// Create a sticker placement under `design_id` at `point`.
    ///
    /// Two users can log the same brand-new placement at once; both pass the
    /// candidate match because neither sticker has committed yet. The insert
    /// therefore runs in a transaction that locks the placement's geohash
    /// neighborhood and re-checks proximity, so the second writer gets a
    /// `Conflict` naming the surviving sticker instead of silently
    /// duplicating it.
    pub async fn create(
        design_id: Uuid,
        point: Point,
        location_description: &str,
        threshold_meters: f64,
        pool: &PgPool,
    ) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let design_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM designs WHERE id = $1")
                .bind(design_id)
                .fetch_optional(&mut *tx)
                .await?;
        if design_exists.is_none() {
            return Err(Error::NotFound(format!("design {design_id} not found")));
        }

        // Transaction-scoped advisory locks over the geohash neighborhood,
        // taken in sorted order so concurrent writers cannot deadlock.
        for cell in geo::placement_cell_neighborhood(point) {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(format!("{design_id}:{cell}"))
                .execute(&mut *tx)
                .await?;
        }

        let nearby = matching::nearby_raw(design_id, point, threshold_meters, &mut *tx).await?;
        if let Some((existing, distance)) = nearby.first() {
            return Err(Error::Conflict {
                message: format!(
                    "a sticker for this design already exists {distance:.0} m away"
                ),
                existing_id: Some(existing.id),
            });
        }

        let sticker = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO stickers (design_id, latitude, longitude, location_description, geo_cell)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(design_id)
        .bind(point.latitude)
        .bind(point.longitude)
        .bind(location_description)
        .bind(geo::placement_cell(point))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(sticker_id = %sticker.id, design_id = %design_id, "created sticker placement");
        Ok(sticker)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM stickers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("sticker {id} not found")))
    }

    pub async fn find_detail(id: Uuid, pool: &PgPool) -> Result<StickerDetail> {
        sqlx::query_as::<_, StickerDetail>(
            r#"
            SELECT s.*,
                   d.name AS design_name,
                   (SELECT COUNT(*) FROM sightings si WHERE si.sticker_id = s.id) AS sighting_count,
                   (SELECT si.photo_uri FROM sightings si
                    WHERE si.sticker_id = s.id
                    ORDER BY si.logged_at ASC LIMIT 1) AS photo_uri
            FROM stickers s
            JOIN designs d ON d.id = s.design_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("sticker {id} not found")))
    }

    pub async fn list_for_design(design_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM stickers WHERE design_id = $1 ORDER BY created_at DESC",
        )
        .bind(design_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// All placements across designs, newest first (the map feed).
    pub async fn list_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM stickers ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub fn location(&self) -> Point {
        Point::new(self.latitude, self.longitude)
    }
}
