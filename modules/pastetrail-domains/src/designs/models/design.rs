use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use pastetrail_common::{Error, Result};

/// A reusable sticker artwork. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Design {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub text: String,
    pub image_url: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Design annotated with its creator's username (for detail views).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DesignWithCreator {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub design: Design,
    pub creator_username: Option<String>,
}

impl Design {
    pub async fn create(
        name: &str,
        description: &str,
        text: &str,
        image_url: &str,
        creator_id: Uuid,
        pool: &PgPool,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::Validation("design name must not be empty".to_string()));
        }

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO designs (name, description, text, image_url, creator_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(text)
        .bind(image_url)
        .bind(creator_id)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Error::NotFound(format!("user {creator_id} not found"))
            }
            _ => e.into(),
        })
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM designs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("design {id} not found")))
    }

    pub async fn find_with_creator(id: Uuid, pool: &PgPool) -> Result<DesignWithCreator> {
        sqlx::query_as::<_, DesignWithCreator>(
            r#"
            SELECT d.*, u.username AS creator_username
            FROM designs d
            LEFT JOIN users u ON u.id = d.creator_id
            WHERE d.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("design {id} not found")))
    }

    pub async fn list_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM designs ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_by_creator(creator_id: Uuid, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM designs WHERE creator_id = $1 ORDER BY created_at DESC",
        )
        .bind(creator_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
