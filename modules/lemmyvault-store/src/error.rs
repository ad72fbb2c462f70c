use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True when the error is a UNIQUE constraint violation, i.e. the row
    /// already exists.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Database(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    }
}
