use admitdesk_core::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid store path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Node at '{0}' is not an integer counter")]
    NotACounter(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store is closed")]
    Closed,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn invalid_path(path: &str, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPath { .. } => RepoError::invalid(err.to_string()),
            StoreError::Closed | StoreError::Database(sqlx::Error::PoolClosed) => {
                RepoError::Canceled
            }
            StoreError::NotACounter(_)
            | StoreError::Unavailable(_)
            | StoreError::Database(_) => RepoError::unavailable(err.to_string()),
        }
    }
}
