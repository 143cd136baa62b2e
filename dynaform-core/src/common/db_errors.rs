//! Database error categorisation for logging
//!
//! Persistence failures are never shown to clients. Services call
//! [`log_db_error`] before surfacing a generic error so operators still see
//! what went wrong and whether it is worth retrying.

use sea_orm::DbErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    NotFound,
    UniqueViolation,
    ForeignKeyViolation,
    ConnectionError,
    Timeout,
    /// SQLite reports lock contention as "database is locked" / "busy"
    Busy,
    Unknown,
}

impl DbErrorKind {
    pub fn from_db_err(err: &DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(e) if e.to_string().to_lowercase().contains("timeout") => Self::Timeout,
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::ConnectionError,
            other => {
                let msg = other.to_string().to_lowercase();
                if msg.contains("unique") || msg.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg.contains("foreign key") {
                    Self::ForeignKeyViolation
                } else if msg.contains("locked") || msg.contains("busy") {
                    Self::Busy
                } else if msg.contains("timeout") {
                    Self::Timeout
                } else {
                    Self::Unknown
                }
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::Timeout | Self::Busy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::UniqueViolation => "unique_violation",
            Self::ForeignKeyViolation => "foreign_key_violation",
            Self::ConnectionError => "connection_error",
            Self::Timeout => "timeout",
            Self::Busy => "busy",
            Self::Unknown => "unknown",
        }
    }
}

/// Format a database error with the operation that produced it.
pub fn format_db_error(operation: &str, err: &DbErr) -> (DbErrorKind, String) {
    let kind = DbErrorKind::from_db_err(err);
    let message = match kind {
        DbErrorKind::NotFound => format!("{}: record not found", operation),
        _ => format!("{}: {}", operation, err),
    };
    (kind, message)
}

/// Log a database error at error level and hand it back for propagation.
pub fn log_db_error(operation: &str, err: DbErr) -> DbErr {
    let (kind, message) = format_db_error(operation, &err);
    tracing::error!(
        kind = kind.as_str(),
        retryable = kind.is_retryable(),
        "{}",
        message
    );
    err
}
