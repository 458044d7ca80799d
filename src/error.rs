use thiserror::Error;

use crate::validate::FieldError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ValidationError: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("NotFound: {0}")]
    NotFound(&'static str),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("DatabaseError: {0}")]
    Database(#[from] libsql::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub fn invalid(field: &str, message: &str) -> Self {
        StoreError::Validation(vec![FieldError::new(field, message)])
    }

    /// Maps a UNIQUE constraint failure to a conflict, anything else stays a database error.
    pub fn unique_violation(err: libsql::Error, message: &str) -> Self {
        if err.to_string().contains("UNIQUE constraint failed") {
            StoreError::Conflict(message.to_string())
        } else {
            StoreError::Database(err)
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}
