use thiserror::Error;

use super::{DomainError, ErrorKind};

#[derive(Error, Debug)]
pub enum SubmitterError {
    #[error("Submitter '{0}' not found")]
    NotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Verification code expired or was never issued")]
    OtpExpired,

    #[error("Verification code does not match")]
    OtpMismatch,

    #[error("Message delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DomainError for SubmitterError {
    fn kind(&self) -> ErrorKind {
        match self {
            SubmitterError::NotFound(_) => ErrorKind::NotFound,
            SubmitterError::InvalidIdentifier(_)
            | SubmitterError::OtpExpired
            | SubmitterError::OtpMismatch => ErrorKind::Validation,
            SubmitterError::DeliveryFailed(_) => ErrorKind::Storage,
            SubmitterError::Database(_) => ErrorKind::Persistence,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SubmitterError::NotFound(_) => "SUBMITTER_NOT_FOUND",
            SubmitterError::InvalidIdentifier(_) => "VALIDATION_FAILED",
            SubmitterError::OtpExpired => "OTP_EXPIRED",
            SubmitterError::OtpMismatch => "OTP_MISMATCH",
            SubmitterError::DeliveryFailed(_) => "DELIVERY_FAILED",
            SubmitterError::Database(_) => "DATABASE_ERROR",
        }
    }
}
