use thiserror::Error;

/// Caller supplied malformed or missing input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        ValidationError(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Errors returned by the sales service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Sales record not found with id: {0}")]
    NotFound(i32),

    #[error("Storage error: {0}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ServiceError::Validation(ValidationError::new(reason))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }
}
