use thiserror::Error;

use super::{DomainError, ErrorKind};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError for StorageError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Storage
    }

    fn error_code(&self) -> &'static str {
        "UPLOAD_FAILED"
    }
}
