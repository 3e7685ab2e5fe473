//! Integration tests for the candidate matcher.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

mod support;

use pastetrail_common::Point;
use pastetrail_domains::matching::find_nearby_stickers;
use pastetrail_domains::sightings::Sighting;
use pastetrail_domains::stickers::Sticker;

use support::{fixture_design, fixture_user, test_pool};

const THRESHOLD_M: f64 = 200.0;

#[tokio::test]
async fn design_with_no_stickers_matches_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;

    let candidates =
        find_nearby_stickers(design.id, Point::new(40.71, -73.97), THRESHOLD_M, &pool)
            .await
            .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn nearby_sticker_is_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    let s1 = Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    // ~15m away.
    let candidates =
        find_nearby_stickers(design.id, Point::new(40.7082, -73.9572), THRESHOLD_M, &pool)
            .await
            .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].sticker.id, s1.id);
    assert!(candidates[0].distance_meters <= THRESHOLD_M);
}

#[tokio::test]
async fn faraway_query_matches_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    // ~5km away.
    let candidates =
        find_nearby_stickers(design.id, Point::new(40.7484, -73.9857), THRESHOLD_M, &pool)
            .await
            .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn other_designs_never_leak_into_candidates() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    let other_design = fixture_design(user.id, &pool).await;

    let here = Point::new(40.7081, -73.9571);
    let mine = Sticker::create(design.id, here, "", THRESHOLD_M, &pool)
        .await
        .unwrap();
    Sticker::create(other_design.id, here, "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    let candidates = find_nearby_stickers(design.id, here, THRESHOLD_M, &pool)
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].sticker.id, mine.id);
}

#[tokio::test]
async fn candidates_are_sorted_closest_first_and_annotated() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;

    let origin = Point::new(40.7081, -73.9571);
    // Use a generous threshold so both placements can coexist yet both match.
    let wide = 2_000.0;
    let near = Sticker::create(design.id, Point::new(40.7082, -73.9572), "", 10.0, &pool)
        .await
        .unwrap();
    let far = Sticker::create(design.id, Point::new(40.7130, -73.9620), "", 10.0, &pool)
        .await
        .unwrap();

    Sighting::append(near.id, design.id, user.id, "near.jpg", "", &pool)
        .await
        .unwrap();

    let candidates = find_nearby_stickers(design.id, origin, wide, &pool)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].sticker.id, near.id);
    assert_eq!(candidates[1].sticker.id, far.id);
    assert!(candidates[0].distance_meters <= candidates[1].distance_meters);

    assert_eq!(candidates[0].sighting_count, 1);
    assert_eq!(candidates[0].photo_uri, Some("near.jpg".to_string()));
    assert_eq!(candidates[1].sighting_count, 0);
    assert_eq!(candidates[1].photo_uri, None);
}
