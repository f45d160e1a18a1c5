use bazaar_core::DomainError;

/// Failure from a repository or service call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Optimistic version check failed; the caller may reload and retry.
    #[error("concurrent modification: {0}")]
    Concurrency(String),
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub(crate) fn poisoned() -> Self {
        Self::Backend("store lock poisoned".to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Domain(DomainError::conflict(db.message().to_string()))
            }
            sqlx::Error::RowNotFound => StoreError::Domain(DomainError::NotFound),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}
