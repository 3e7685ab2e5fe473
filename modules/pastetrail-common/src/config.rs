use anyhow::Result;

use crate::types::Point;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Database
    pub database_url: String,

    // Server
    pub host: String,
    pub port: u16,

    // Photo storage
    pub photo_dir: String,

    // Matching
    pub nearby_threshold_meters: f64,

    // Degraded mode: coordinates used when the capture device had no
    // location fix. A known fallback, not an error.
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,

    // Auth
    pub session_secret: String,

    // CORS
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")?,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()?,
            photo_dir: std::env::var("PHOTO_DIR").unwrap_or_else(|_| "photos".to_string()),
            nearby_threshold_meters: std::env::var("NEARBY_THRESHOLD_METERS")
                .unwrap_or_else(|_| "200.0".to_string())
                .parse()
                .unwrap_or(200.0),
            fallback_latitude: std::env::var("FALLBACK_LATITUDE")
                .unwrap_or_else(|_| "40.7128".to_string())
                .parse()
                .unwrap_or(40.7128),
            fallback_longitude: std::env::var("FALLBACK_LONGITUDE")
                .unwrap_or_else(|_| "-74.0060".to_string())
                .parse()
                .unwrap_or(-74.0060),
            session_secret: std::env::var("SESSION_SECRET")?,
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
        })
    }

    pub fn fallback_point(&self) -> Point {
        Point::new(self.fallback_latitude, self.fallback_longitude)
    }
}
