/// Errors raised by the Ingestion Service.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("invalid product shell: {0}")]
    InvalidInput(String),
    #[error("database error: {0}")]
    Database(#[from] watcher_db::DbError),
}

impl IngestionError {
    /// Stable machine-readable error code for logs and downstream consumers.
    pub fn code(&self) -> &'static str {
        match self {
            IngestionError::InvalidInput(_) => "INVALID_INPUT",
            IngestionError::Database(_) => "INGESTION_FAILED",
        }
    }
}
