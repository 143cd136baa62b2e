use thiserror::Error;

use super::{DomainError, ErrorKind};
use crate::common::db_errors::DbErrorKind;

/// Form definition errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Form {0} not found")]
    FormNotFound(i32),

    #[error("Column {0} not found")]
    ColumnNotFound(i32),

    #[error("Form binding {0} not found")]
    BindingNotFound(i32),

    #[error("Option {0} not found")]
    OptionNotFound(i32),

    #[error("Validation rule {0} not found")]
    RuleNotFound(i32),

    #[error("Validation kind {0} not found")]
    ValidationKindNotFound(i32),

    /// Another active binding in the same (form, form number) already uses this column name
    #[error("Column '{name}' already exists in form {form_id} section {form_no}")]
    DuplicateColumn {
        form_id: i32,
        form_no: i32,
        name: String,
    },

    #[error("Column {column_id} is already bound to form {form_id} section {form_no}")]
    AlreadyBound {
        column_id: i32,
        form_id: i32,
        form_no: i32,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl SchemaError {
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl DomainError for SchemaError {
    fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::FormNotFound(_)
            | SchemaError::ColumnNotFound(_)
            | SchemaError::BindingNotFound(_)
            | SchemaError::OptionNotFound(_)
            | SchemaError::RuleNotFound(_)
            | SchemaError::ValidationKindNotFound(_) => ErrorKind::NotFound,
            SchemaError::DuplicateColumn { .. } | SchemaError::AlreadyBound { .. } => {
                ErrorKind::Conflict
            }
            SchemaError::InvalidInput(_) => ErrorKind::Validation,
            // a concurrent insert that lost the race on a unique index
            SchemaError::Database(err)
                if DbErrorKind::from_db_err(err) == DbErrorKind::UniqueViolation =>
            {
                ErrorKind::Conflict
            }
            SchemaError::Database(_) => ErrorKind::Persistence,
        }
    }

    fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Validation => "VALIDATION_FAILED",
            _ => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match (self, self.kind()) {
            (SchemaError::Database(_), ErrorKind::Conflict) => "Resource already exists".to_string(),
            (_, ErrorKind::Persistence) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}
