//! Object stores for relocated media

mod filesystem;
mod http;

use std::sync::Arc;
use std::time::Duration;

use chorus_common::{StorageBackend, StorageConfig};
use chorus_core::error::ProviderError;
use chorus_core::traits::ObjectStore;

pub use filesystem::FsObjectStore;
pub use http::HttpObjectStore;

/// Upload timeout for the HTTP store
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the store selected by configuration
pub fn build_object_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, ProviderError> {
    match config.backend {
        StorageBackend::Filesystem => Ok(Arc::new(FsObjectStore::new(
            &config.upload_dir,
            &config.public_base_url,
        ))),
        StorageBackend::Http => {
            let endpoint = config
                .http_endpoint
                .as_deref()
                .ok_or(ProviderError::NotConfigured("storage endpoint"))?;
            Ok(Arc::new(HttpObjectStore::new(
                endpoint,
                config.http_token.clone(),
                &config.public_base_url,
                UPLOAD_TIMEOUT,
            )?))
        }
    }
}

/// Reject keys that would escape the storage root
pub(crate) fn validate_key(key: &str) -> Result<(), ProviderError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(ProviderError::storage(format!("invalid object key: {key}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("media/1700000000000_0.jpg").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("media//x").is_err());
        assert!(validate_key("").is_err());
    }
}
