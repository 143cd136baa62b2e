use thiserror::Error;

use super::{DomainError, ErrorKind, SubmissionError};

/// Payment-gated submission errors
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Submitter '{0}' not found")]
    SubmitterNotFound(String),

    /// Gateway callback did not carry a signature matching our secret
    #[error("Payment could not be verified")]
    InvalidSignature,

    #[error("Form {0} not found")]
    FormNotFound(i32),

    #[error("Form {0} has no fee configured")]
    NoFeeConfigured(i32),

    #[error("Payment {0} has already been used")]
    AlreadyUsed(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DomainError for PaymentError {
    fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::SubmitterNotFound(_) | PaymentError::FormNotFound(_) => {
                ErrorKind::NotFound
            }
            PaymentError::InvalidSignature | PaymentError::Gateway(_) => ErrorKind::Payment,
            PaymentError::NoFeeConfigured(_) => ErrorKind::Validation,
            PaymentError::AlreadyUsed(_) => ErrorKind::Conflict,
            PaymentError::Submission(inner) => inner.kind(),
            PaymentError::Database(_) => ErrorKind::Persistence,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PaymentError::SubmitterNotFound(_) => "SUBMITTER_NOT_FOUND",
            PaymentError::InvalidSignature => "INVALID_SIGNATURE",
            PaymentError::FormNotFound(_) => "FORM_NOT_FOUND",
            PaymentError::NoFeeConfigured(_) => "NO_FEE_CONFIGURED",
            PaymentError::AlreadyUsed(_) => "PAYMENT_ALREADY_USED",
            PaymentError::Gateway(_) => "GATEWAY_ERROR",
            PaymentError::Submission(inner) => inner.error_code(),
            PaymentError::Database(_) => "DATABASE_ERROR",
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            PaymentError::Gateway(_) => 502,
            PaymentError::Submission(inner) => inner.http_status_code(),
            other => other.kind().http_status_code(),
        }
    }

    fn public_message(&self) -> String {
        match self {
            PaymentError::Submission(inner) => inner.public_message(),
            PaymentError::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_signature_is_distinct() {
        let err = PaymentError::InvalidSignature;
        assert_eq!(err.kind(), ErrorKind::Payment);
        assert_eq!(err.error_code(), "INVALID_SIGNATURE");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_wrapped_submission_error_keeps_code() {
        let err = PaymentError::from(SubmissionError::MissingRequiredField(2));
        assert_eq!(err.error_code(), "MISSING_REQUIRED_FIELD");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_reused_payment_is_a_conflict() {
        let err = PaymentError::AlreadyUsed("pay_1".to_string());
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.error_code(), "PAYMENT_ALREADY_USED");
        assert_eq!(err.http_status_code(), 409);
    }
}
