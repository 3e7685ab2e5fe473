use std::f64::consts::PI;

use geohash::Coord;
use pastetrail_common::Point;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geohash precision for the duplicate-placement guard. Precision 7 cells
/// are roughly 150 m across, on the order of the default match threshold.
const PLACEMENT_CELL_PRECISION: usize = 7;

/// Haversine distance between two points, in meters.
pub fn haversine_distance_meters(a: Point, b: Point) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let dlat = to_rad(b.latitude - a.latitude);
    let dlng = to_rad(b.longitude - a.longitude);

    let h = (dlat / 2.0).sin().powi(2)
        + to_rad(a.latitude).cos() * to_rad(b.latitude).cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// Geohash bucket key for a sticker placement. Out-of-range coordinates are
/// clamped rather than rejected; the result still buckets deterministically.
pub fn placement_cell(point: Point) -> String {
    let lat = point.latitude.clamp(-90.0, 90.0);
    let lng = point.longitude.clamp(-180.0, 180.0);
    geohash::encode(Coord { x: lng, y: lat }, PLACEMENT_CELL_PRECISION)
        .unwrap_or_else(|_| format!("{lat:.3}:{lng:.3}"))
}

/// The placement cell plus its eight geohash neighbors. A placement near a
/// cell edge can collide with a sticker in the adjacent cell, so the
/// creation guard locks the whole neighborhood.
pub fn placement_cell_neighborhood(point: Point) -> Vec<String> {
    let center = placement_cell(point);
    let mut cells = match geohash::neighbors(&center) {
        Ok(n) => vec![
            n.n, n.ne, n.e, n.se, n.s, n.sw, n.w, n.nw,
        ],
        Err(_) => Vec::new(),
    };
    cells.push(center);
    cells.sort();
    cells
}

/// A latitude/longitude window that contains every point within
/// `radius_meters` of `origin`. Used as a cheap SQL pre-filter before exact
/// haversine distances are computed.
pub fn bounding_box(origin: Point, radius_meters: f64) -> (f64, f64, f64, f64) {
    // One degree of latitude is ~111.32 km everywhere; longitude shrinks
    // with the cosine of latitude.
    const METERS_PER_DEGREE: f64 = 111_320.0;

    let dlat = radius_meters / METERS_PER_DEGREE;
    let cos_lat = (origin.latitude * PI / 180.0).cos().abs().max(1e-6);
    let dlng = radius_meters / (METERS_PER_DEGREE * cos_lat);

    (
        origin.latitude - dlat,
        origin.latitude + dlat,
        origin.longitude - dlng,
        origin.longitude + dlng,
    )
}
