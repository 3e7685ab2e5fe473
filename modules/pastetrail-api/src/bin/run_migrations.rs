//! Applies pending schema migrations, then exits. Migrations are embedded
//! at compile time via `sqlx::migrate!`, so the binary carries everything
//! it needs; deploys run it once before starting the api.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("could not connect to database")?;

    println!("applying pending migrations");
    sqlx::migrate!("../../migrations").run(&pool).await?;
    println!("schema is up to date");

    Ok(())
}
