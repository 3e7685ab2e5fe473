#![allow(dead_code)]

use sqlx::PgPool;
use uuid::Uuid;

use pastetrail_domains::designs::Design;
use pastetrail_domains::users::{hash_password, User};

/// Get a test database pool, or skip if no test DB is available.
/// Migrations are applied on first use; fixtures are unique per call so
/// tests never depend on a clean database.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::migrate!("../../migrations").run(&pool).await.ok()?;
    Some(pool)
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn fixture_user(pool: &PgPool) -> User {
    User::create(
        &unique("user"),
        "someone@example.com",
        &hash_password("correct horse battery staple"),
        pool,
    )
    .await
    .unwrap()
}

pub async fn fixture_design(creator_id: Uuid, pool: &PgPool) -> Design {
    Design::create(
        &unique("design"),
        "test artwork",
        "",
        "https://example.com/art.png",
        creator_id,
        pool,
    )
    .await
    .unwrap()
}
