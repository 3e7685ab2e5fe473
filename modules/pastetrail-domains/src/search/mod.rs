//! Substring search over designs and users.
//!
//! Intentionally simple: case-insensitive ILIKE match, no relevance scoring.
//! An empty query returns an empty result set rather than the whole table —
//! a deliberate UX choice for the empty search box.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use pastetrail_common::Result;

use crate::designs::Design;

/// User search row, annotated with display aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSearchResult {
    pub id: Uuid,
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub sighting_count: i64,
    pub sticker_count: i64,
}

/// Case-insensitive substring match over design name, description, and
/// free text, newest first.
pub async fn search_designs(query: &str, pool: &PgPool) -> Result<Vec<Design>> {
    let Some(pattern) = like_pattern(query) else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, Design>(
        r#"
        SELECT * FROM designs
        WHERE name ILIKE $1 OR description ILIKE $1 OR text ILIKE $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Case-insensitive substring match over usernames, alphabetical, each row
/// carrying its sighting and distinct-sticker counts.
pub async fn search_users(query: &str, pool: &PgPool) -> Result<Vec<UserSearchResult>> {
    let Some(pattern) = like_pattern(query) else {
        return Ok(Vec::new());
    };

    sqlx::query_as::<_, UserSearchResult>(
        r#"
        SELECT u.id, u.username, u.joined_at,
               (SELECT COUNT(*) FROM sightings si WHERE si.user_id = u.id) AS sighting_count,
               (SELECT COUNT(DISTINCT si.sticker_id) FROM sightings si WHERE si.user_id = u.id) AS sticker_count
        FROM users u
        WHERE u.username ILIKE $1
        ORDER BY u.username ASC
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// `%query%` with LIKE metacharacters escaped; `None` for blank input.
fn like_pattern(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    let escaped = trimmed
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_produce_no_pattern() {
        assert_eq!(like_pattern(""), None);
        assert_eq!(like_pattern("   "), None);
    }

    #[test]
    fn metacharacters_are_escaped() {
        assert_eq!(like_pattern("50%_off"), Some("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn plain_query_is_wrapped() {
        assert_eq!(like_pattern("walls"), Some("%walls%".to_string()));
    }
}
