use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid user ID: {0}")]
    InvalidUserId(String),

    #[error("Unrecognized role: {0}")]
    UnrecognizedRole(String),

    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),

    #[error("User role not found: {0}")]
    UserRoleNotFound(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}
