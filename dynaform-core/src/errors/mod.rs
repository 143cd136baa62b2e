//! Domain-specific error types for dynaform
//!
//! Each service area owns a `thiserror` enum. All of them classify into one
//! [`ErrorKind`], which is what the HTTP layer uses to pick a status code.
//!
//! # Error Categories
//!
//! - **SchemaError**: form, column, binding, option and rule maintenance
//! - **SubmissionError**: validation and persistence of submitted values
//! - **PaymentError**: signature verification and payment-gated submissions
//! - **SubmitterError**: submitter registration and OTP challenges
//! - **StorageError**: file storage collaborator failures
//!
//! # Examples
//!
//! ```rust
//! use dynaform::errors::{DomainError, ErrorKind, SubmissionError};
//!
//! let err = SubmissionError::MissingRequiredField(7);
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! assert_eq!(err.error_code(), "MISSING_REQUIRED_FIELD");
//! ```

pub mod payment;
pub mod schema;
pub mod storage;
pub mod submission;
pub mod submitter;

pub use payment::PaymentError;
pub use schema::SchemaError;
pub use storage::StorageError;
pub use submission::SubmissionError;
pub use submitter::SubmitterError;

/// Error taxonomy shared by every domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Payment,
    Storage,
    Persistence,
}

impl ErrorKind {
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Conflict => 409,
            Self::NotFound => 404,
            Self::Payment => 400,
            Self::Storage => 502,
            Self::Persistence => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::Conflict | Self::NotFound | Self::Payment
        )
    }
}

/// Common classification surface for domain errors.
pub trait DomainError: std::error::Error {
    fn kind(&self) -> ErrorKind;

    fn error_code(&self) -> &'static str;

    /// HTTP status for this error. Defaults to the kind's status.
    fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Message safe to show a client. Persistence failures never leak details.
    fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Persistence => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

pub type SubmissionResult<T> = Result<T, SubmissionError>;

pub type PaymentResult<T> = Result<T, PaymentError>;

pub type SubmitterResult<T> = Result<T, SubmitterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::Conflict.http_status_code(), 409);
        assert_eq!(ErrorKind::Persistence.http_status_code(), 500);
        assert!(ErrorKind::Payment.is_client_error());
        assert!(!ErrorKind::Storage.is_client_error());
    }

    #[test]
    fn test_persistence_message_is_generic() {
        let err = SchemaError::Database(sea_orm::DbErr::Custom("disk I/O error".to_string()));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
