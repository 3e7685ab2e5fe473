use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pastetrail_common::AppConfig;

mod auth;
mod error;
mod photos;
mod routes;

use photos::FsPhotoStore;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pastetrail=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    let photo_store = FsPhotoStore::new(&config.photo_dir).await?;

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState {
        pool,
        photos: Arc::new(photo_store),
        config,
    });

    let app = routes::build_router(state);

    info!(%addr, "pastetrail api listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
