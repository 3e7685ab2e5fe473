use uuid::Uuid;

/// Result type alias for pastetrail operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        /// The already-committed record that caused the conflict, when known
        /// (e.g. the existing sticker on a duplicate-placement rejection).
        existing_id: Option<Uuid>,
    },

    /// Transient I/O failure (photo store, network). No entity was written
    /// by the failing step, so the caller may retry.
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl Error {
    /// Whether a retry is safe: the failing operation did not commit anything.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Database(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Self::NotFound("record not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict {
                message: db.message().to_string(),
                existing_id: None,
            },
            _ => Self::Database(e),
        }
    }
}
