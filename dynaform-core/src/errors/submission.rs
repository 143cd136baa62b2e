use rust_decimal::Decimal;
use thiserror::Error;

use super::{DomainError, ErrorKind, StorageError, SubmitterError};

/// Submission validation and persistence errors
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Form {0} not found or no longer accepting submissions")]
    FormNotFound(i32),

    /// The form carries a fee, so values must arrive through the payment flow
    #[error("Form {form_id} requires a payment of {fee}")]
    PaymentRequired { form_id: i32, fee: Decimal },

    #[error("Column {0} is required")]
    MissingRequiredField(i32),

    #[error("PDF for column {col_id} has {pages} pages; it must have between 2 and 3 pages")]
    FilePageCountInvalid { col_id: i32, pages: usize },

    #[error("File for column {col_id} could not be read: {reason}")]
    FileValidationError { col_id: i32, reason: String },

    #[error("Invalid value for column {col_id}: {reason}")]
    InvalidValue { col_id: i32, reason: String },

    #[error("Submission contains no values for this form")]
    EmptySubmission,

    #[error("A submission ({submission_id}) already exists for form {form_id}")]
    DuplicateSubmission {
        form_id: i32,
        submission_id: String,
    },

    #[error("Submission {0} not found")]
    SubmissionNotFound(String),

    #[error("Submitter '{0}' not found")]
    SubmitterNotFound(String),

    #[error("Invalid submitter: {0}")]
    InvalidSubmitter(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl SubmissionError {
    /// Column the rejection refers to, if any.
    pub fn column_id(&self) -> Option<i32> {
        match self {
            SubmissionError::MissingRequiredField(col_id) => Some(*col_id),
            SubmissionError::FilePageCountInvalid { col_id, .. }
            | SubmissionError::FileValidationError { col_id, .. }
            | SubmissionError::InvalidValue { col_id, .. } => Some(*col_id),
            _ => None,
        }
    }
}

impl From<SubmitterError> for SubmissionError {
    fn from(err: SubmitterError) -> Self {
        match err {
            SubmitterError::NotFound(identifier) => SubmissionError::SubmitterNotFound(identifier),
            SubmitterError::Database(db) => SubmissionError::Database(db),
            SubmitterError::InvalidIdentifier(reason) => SubmissionError::InvalidSubmitter(reason),
            other => SubmissionError::InvalidSubmitter(other.to_string()),
        }
    }
}

impl DomainError for SubmissionError {
    fn kind(&self) -> ErrorKind {
        match self {
            SubmissionError::PaymentRequired { .. }
            | SubmissionError::MissingRequiredField(_)
            | SubmissionError::FilePageCountInvalid { .. }
            | SubmissionError::FileValidationError { .. }
            | SubmissionError::InvalidValue { .. }
            | SubmissionError::EmptySubmission
            | SubmissionError::InvalidSubmitter(_) => ErrorKind::Validation,
            SubmissionError::DuplicateSubmission { .. } => ErrorKind::Conflict,
            SubmissionError::FormNotFound(_)
            | SubmissionError::SubmissionNotFound(_)
            | SubmissionError::SubmitterNotFound(_) => ErrorKind::NotFound,
            SubmissionError::Storage(_) => ErrorKind::Storage,
            SubmissionError::Database(_) => ErrorKind::Persistence,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SubmissionError::FormNotFound(_) => "FORM_NOT_FOUND",
            SubmissionError::PaymentRequired { .. } => "PAYMENT_REQUIRED",
            SubmissionError::MissingRequiredField(_) => "MISSING_REQUIRED_FIELD",
            SubmissionError::FilePageCountInvalid { .. } => "FILE_PAGE_COUNT_INVALID",
            SubmissionError::FileValidationError { .. } => "FILE_VALIDATION_ERROR",
            SubmissionError::InvalidValue { .. } => "INVALID_VALUE",
            SubmissionError::EmptySubmission => "EMPTY_SUBMISSION",
            SubmissionError::DuplicateSubmission { .. } => "DUPLICATE_SUBMISSION",
            SubmissionError::SubmissionNotFound(_) => "SUBMISSION_NOT_FOUND",
            SubmissionError::SubmitterNotFound(_) => "SUBMITTER_NOT_FOUND",
            SubmissionError::InvalidSubmitter(_) => "INVALID_SUBMITTER",
            SubmissionError::Storage(_) => "UPLOAD_FAILED",
            SubmissionError::Database(_) => "DATABASE_ERROR",
        }
    }

    fn http_status_code(&self) -> u16 {
        match self {
            SubmissionError::PaymentRequired { .. } => 402,
            other => other.kind().http_status_code(),
        }
    }
}
