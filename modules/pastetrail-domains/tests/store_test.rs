//! Integration tests for the entity models.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

mod support;

use pastetrail_common::{Error, Point};
use pastetrail_domains::designs::Design;
use pastetrail_domains::sightings::Sighting;
use pastetrail_domains::stickers::Sticker;
use pastetrail_domains::users::User;
use uuid::Uuid;

use support::{fixture_design, fixture_user, test_pool, unique};

const THRESHOLD_M: f64 = 200.0;

// =========================================================================
// Users
// =========================================================================

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let username = unique("taken");
    User::create(&username, "a@example.com", "salt:key", &pool)
        .await
        .unwrap();

    let err = User::create(&username, "b@example.com", "salt:key", &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
}

#[tokio::test]
async fn empty_username_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let err = User::create("  ", "a@example.com", "salt:key", &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

// =========================================================================
// Designs
// =========================================================================

#[tokio::test]
async fn design_create_fetch_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;

    let name = unique("ghost-cat");
    let created = Design::create(
        &name,
        "a cat, ghostly",
        "BOO",
        "https://example.com/cat.png",
        user.id,
        &pool,
    )
    .await
    .unwrap();

    let fetched = Design::find_by_id(created.id, &pool).await.unwrap();
    assert_eq!(fetched.name, name);
    assert_eq!(fetched.description, "a cat, ghostly");
    assert_eq!(fetched.text, "BOO");
    assert_eq!(fetched.creator_id, user.id);
}

#[tokio::test]
async fn blank_design_name_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;

    let err = Design::create("   ", "", "", "", user.id, &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn design_with_unknown_creator_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let err = Design::create(&unique("orphan"), "", "", "", Uuid::new_v4(), &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// =========================================================================
// Stickers
// =========================================================================

#[tokio::test]
async fn sticker_for_unknown_design_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let err = Sticker::create(
        Uuid::new_v4(),
        Point::new(40.7081, -73.9571),
        "",
        THRESHOLD_M,
        &pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn stickers_list_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;

    // Far enough apart not to trip the duplicate-placement guard.
    let first = Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();
    let second = Sticker::create(design.id, Point::new(40.7484, -73.9857), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    let listed = Sticker::list_for_design(design.id, &pool).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[tokio::test]
async fn recent_stickers_span_designs_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design_a = fixture_design(user.id, &pool).await;
    let design_b = fixture_design(user.id, &pool).await;

    let older = Sticker::create(design_a.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();
    let newer = Sticker::create(design_b.id, Point::new(40.7484, -73.9857), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    // The feed is global, so other rows may interleave; check relative order.
    let feed = Sticker::list_recent(500, &pool).await.unwrap();
    let pos = |id| feed.iter().position(|s| s.id == id);
    let (newer_pos, older_pos) = (pos(newer.id).unwrap(), pos(older.id).unwrap());
    assert!(newer_pos < older_pos);

    // Ordering holds for the list as a whole, not just our rows.
    let created: Vec<_> = feed.iter().map(|s| s.created_at).collect();
    let mut sorted = created.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(created, sorted);
}

#[tokio::test]
async fn duplicate_placement_is_a_conflict_naming_the_survivor() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;

    let original = Sticker::create(
        design.id,
        Point::new(40.7081, -73.9571),
        "lamppost",
        THRESHOLD_M,
        &pool,
    )
    .await
    .unwrap();

    // ~15m away: inside the threshold, so this is the same placement.
    let err = Sticker::create(
        design.id,
        Point::new(40.7082, -73.9572),
        "same lamppost",
        THRESHOLD_M,
        &pool,
    )
    .await
    .unwrap_err();

    match err {
        Error::Conflict { existing_id, .. } => assert_eq!(existing_id, Some(original.id)),
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Another design at the same spot is fine.
    let other_design = fixture_design(user.id, &pool).await;
    Sticker::create(
        other_design.id,
        Point::new(40.7081, -73.9571),
        "",
        THRESHOLD_M,
        &pool,
    )
    .await
    .unwrap();
}

// =========================================================================
// Sightings
// =========================================================================

#[tokio::test]
async fn mismatched_design_append_fails_and_writes_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    let other_design = fixture_design(user.id, &pool).await;
    let sticker = Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    let err = Sighting::append(sticker.id, other_design.id, user.id, "p.jpg", "", &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_eq!(Sighting::count_for_sticker(sticker.id, &pool).await.unwrap(), 0);
}

#[tokio::test]
async fn appended_sighting_carries_the_stickers_design() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    let sticker = Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    let sighting = Sighting::append(sticker.id, design.id, user.id, "p.jpg", "hello", &pool)
        .await
        .unwrap();

    assert_eq!(sighting.sticker_id, sticker.id);
    assert_eq!(sighting.design_id, design.id);
    assert_eq!(sighting.user_id, user.id);
    assert_eq!(sighting.note, "hello");
}

#[tokio::test]
async fn first_photo_is_the_earliest_sighting() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    let sticker = Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    Sighting::append(sticker.id, design.id, user.id, "first.jpg", "", &pool)
        .await
        .unwrap();
    Sighting::append(sticker.id, design.id, user.id, "second.jpg", "", &pool)
        .await
        .unwrap();

    assert_eq!(
        Sighting::first_photo(sticker.id, &pool).await.unwrap(),
        Some("first.jpg".to_string())
    );
    assert_eq!(Sighting::count_for_sticker(sticker.id, &pool).await.unwrap(), 2);
}

#[tokio::test]
async fn user_sightings_come_back_annotated_and_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = fixture_user(&pool).await;
    let design = fixture_design(user.id, &pool).await;
    let sticker = Sticker::create(design.id, Point::new(40.7081, -73.9571), "", THRESHOLD_M, &pool)
        .await
        .unwrap();

    Sighting::append(sticker.id, design.id, user.id, "a.jpg", "", &pool)
        .await
        .unwrap();
    let latest = Sighting::append(sticker.id, design.id, user.id, "b.jpg", "", &pool)
        .await
        .unwrap();

    let listed = Sighting::list_for_user(user.id, &pool).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].sighting.id, latest.id);
    assert_eq!(listed[0].design_name, design.name);
}
