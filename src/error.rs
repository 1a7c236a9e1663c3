/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error came from the storage layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Migration(_))
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
