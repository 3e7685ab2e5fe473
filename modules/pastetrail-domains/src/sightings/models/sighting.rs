use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use pastetrail_common::{Error, Result};

/// One observation event of a sticker. Append-only; never updated.
///
/// `design_id` is a read-only projection of the target sticker's design,
/// kept for query convenience. The append statement derives it from the
/// sticker row, so a caller-supplied mismatch can never be written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sighting {
    pub id: Uuid,
    pub sticker_id: Uuid,
    pub design_id: Uuid,
    pub user_id: Uuid,
    pub photo_uri: String,
    pub note: String,
    pub logged_at: DateTime<Utc>,
}

/// Sighting annotated with its design's name and image (profile views).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SightingWithDesign {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub sighting: Sighting,
    pub design_name: String,
    pub design_image_url: String,
}

impl Sighting {
    /// Append a sighting of `sticker_id`. Fails with `NotFound` and writes
    /// nothing when the sticker is unknown or does not belong to
    /// `design_id`.
    pub async fn append(
        sticker_id: Uuid,
        design_id: Uuid,
        user_id: Uuid,
        photo_uri: &str,
        note: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let inserted = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO sightings (sticker_id, design_id, user_id, photo_uri, note)
            SELECT st.id, st.design_id, $3, $4, $5
            FROM stickers st
            WHERE st.id = $1 AND st.design_id = $2
            RETURNING *
            "#,
        )
        .bind(sticker_id)
        .bind(design_id)
        .bind(user_id)
        .bind(photo_uri)
        .bind(note)
        .fetch_optional(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Error::NotFound(format!("user {user_id} not found"))
            }
            _ => e.into(),
        })?;

        inserted.ok_or_else(|| {
            Error::NotFound(format!(
                "sticker {sticker_id} not found for design {design_id}"
            ))
        })
    }

    pub async fn list_for_sticker(sticker_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM sightings WHERE sticker_id = $1 ORDER BY logged_at DESC",
        )
        .bind(sticker_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_design(design_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM sightings WHERE design_id = $1 ORDER BY logged_at DESC",
        )
        .bind(design_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_user(user_id: Uuid, pool: &PgPool) -> Result<Vec<SightingWithDesign>> {
        sqlx::query_as::<_, SightingWithDesign>(
            r#"
            SELECT si.*, d.name AS design_name, d.image_url AS design_image_url
            FROM sightings si
            JOIN designs d ON d.id = si.design_id
            WHERE si.user_id = $1
            ORDER BY si.logged_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_for_sticker(sticker_id: Uuid, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sightings WHERE sticker_id = $1")
            .bind(sticker_id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// The sticker's representative image: its earliest sighting's photo.
    pub async fn first_photo(sticker_id: Uuid, pool: &PgPool) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT photo_uri FROM sightings WHERE sticker_id = $1 ORDER BY logged_at ASC LIMIT 1",
        )
        .bind(sticker_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
