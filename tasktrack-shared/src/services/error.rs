use tracing::error;

use crate::auth::password::PasswordError;
use crate::models::{EditRejected, InvalidCode};
use crate::repository::RepositoryError;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the services
///
/// The API maps these one-to-one onto 404, 400 and 500 responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A task, user or comment does not exist
    #[error("{0}")]
    NotFound(String),

    /// Wrong actor, malformed value or violated constraint
    #[error("{0}")]
    InvalidArgument(String),

    /// Storage or hashing failure; the message is for logs only
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str, key: &str, value: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} with {} {} not found", entity, key, value))
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(constraint) => {
                ServiceError::InvalidArgument(format!("Value already in use ({})", constraint))
            }
            RepositoryError::NotFound(what) => ServiceError::NotFound(format!("{} not found", what)),
            RepositoryError::Rejected(rejected) => rejected.into(),
            RepositoryError::Persistence(e) => {
                error!(error = %e, "Repository failure");
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        error!(error = %err, "Password hashing failure");
        ServiceError::Internal(err.to_string())
    }
}

impl From<EditRejected> for ServiceError {
    fn from(err: EditRejected) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

impl From<InvalidCode> for ServiceError {
    fn from(err: InvalidCode) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::not_found("Task", "id", 7);
        assert_eq!(err.to_string(), "Task with id 7 not found");
    }

    #[test]
    fn test_repository_conflict_is_invalid_argument() {
        let err = ServiceError::from(RepositoryError::Conflict("users_email_key".to_string()));
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn test_rejected_edit_is_invalid_argument() {
        let err = ServiceError::from(RepositoryError::Rejected(EditRejected::NotAuthor));
        assert_eq!(err, ServiceError::invalid("Only the author can update the task"));
    }

    #[test]
    fn test_repository_persistence_is_internal() {
        let err = ServiceError::from(RepositoryError::persistence(std::io::Error::other("boom")));
        assert_eq!(err, ServiceError::Internal("boom".to_string()));
    }

    #[test]
    fn test_invalid_code_is_invalid_argument() {
        let err = ServiceError::from(InvalidCode {
            kind: "TaskPriority",
            code: 9,
        });
        assert_eq!(
            err,
            ServiceError::InvalidArgument("Invalid TaskPriority value: 9".to_string())
        );
    }
}
