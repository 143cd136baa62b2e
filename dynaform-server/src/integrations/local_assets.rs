use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dynaform::collaborators::AssetStore;
use dynaform::errors::StorageError;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Writes uploads under a local directory that the router serves at `public_prefix`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Random name that keeps a sane extension from the client's file name.
    fn stored_name(file_name: &str) -> String {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        format!("{}{}", Uuid::new_v4().simple(), extension)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(
        &self,
        file_name: &str,
        _content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        fs::create_dir_all(&self.root).await?;
        let name = Self::stored_name(file_name);
        fs::write(self.root.join(&name), bytes).await?;
        debug!("Stored upload '{}' as {} ({} bytes)", file_name, name, bytes.len());
        Ok(format!("{}/{}", self.public_prefix, name))
    }
}
