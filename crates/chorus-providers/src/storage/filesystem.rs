//! Local-disk object store

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, instrument};

use chorus_core::error::ProviderError;
use chorus_core::traits::ObjectStore;

use super::validate_key;

/// Writes objects under a root directory; the relay serves them at `public_base_url`
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl AsRef<Path>, public_base_url: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, ProviderError> {
        validate_key(key)?;
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(ProviderError::storage)?;
        }
        fs::write(&path, &bytes)
            .await
            .map_err(ProviderError::storage)?;

        debug!(path = %path.display(), "Object written");
        Ok(format!("{}/{key}", self.public_base_url))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(ProviderError::storage)?;
        let meta = fs::metadata(&self.root)
            .await
            .map_err(ProviderError::storage)?;
        if meta.permissions().readonly() {
            return Err(ProviderError::storage(format!(
                "{} is read-only",
                self.root.display()
            )));
        }
        Ok(())
    }
}
