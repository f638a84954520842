/// High-level image store
use crate::{
    config::{ServiceConfig, StorageConfig},
    error::{ApiError, ApiResult},
    image_store::ImageBackend,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Image store wrapping a backend with naming, size limits and a timeout
///
/// Backend calls are bounded by a timeout; a slow or stuck store surfaces as
/// an upstream failure rather than hanging the request.
#[derive(Clone)]
pub struct ImageStore {
    backend: Arc<dyn ImageBackend>,
    max_size: usize,
    timeout: Duration,
    public_url: String,
}

impl ImageStore {
    pub fn new(backend: Arc<dyn ImageBackend>, storage: &StorageConfig, service: &ServiceConfig) -> Self {
        Self {
            backend,
            max_size: storage.image_upload_limit,
            timeout: Duration::from_secs(storage.image_upload_timeout),
            public_url: service.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store an upload under a fresh random name, returning the name
    pub async fn store_upload(&self, data: Vec<u8>, content_type: &str) -> ApiResult<String> {
        if data.is_empty() {
            return Err(ApiError::Validation("Empty image upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::Validation(format!(
                "Image exceeds maximum size of {} bytes",
                self.max_size
            )));
        }

        let extension = extension_for(content_type).ok_or_else(|| {
            ApiError::Validation(format!("Unsupported image type: {}", content_type))
        })?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);

        tokio::time::timeout(self.timeout, self.backend.put(&name, data))
            .await
            .map_err(|_| ApiError::Upstream("Image store timed out".to_string()))??;

        Ok(name)
    }

    /// Fetch stored image bytes
    pub async fn fetch(&self, name: &str) -> ApiResult<Option<Vec<u8>>> {
        tokio::time::timeout(self.timeout, self.backend.get(name))
            .await
            .map_err(|_| ApiError::Upstream("Image store timed out".to_string()))?
    }

    /// Remove a stored image; used for compensation and account deletion
    pub async fn discard(&self, name: &str) -> ApiResult<()> {
        tokio::time::timeout(self.timeout, self.backend.delete(name))
            .await
            .map_err(|_| ApiError::Upstream("Image store timed out".to_string()))?
    }

    /// Externally reachable URL for a stored image name
    ///
    /// Values that are already absolute URLs (federated profile pictures)
    /// pass through unchanged.
    pub fn url_for(&self, name: &str) -> String {
        if name.starts_with("http://") || name.starts_with("https://") {
            return name.to_string();
        }
        format!("{}/api/v1/images/{}", self.public_url, name)
    }

    /// Maximum accepted upload size in bytes
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// File extension for an accepted image content type
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// Content type for a stored image name, from its extension
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::image_store::DiskImageBackend;
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> ImageStore {
        let config = test_config();
        ImageStore::new(
            Arc::new(DiskImageBackend::new(dir.to_path_buf())),
            &config.storage,
            &config.service,
        )
    }

    #[tokio::test]
    async fn test_store_names_with_extension() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let name = store
            .store_upload(b"pngdata".to_vec(), "image/png")
            .await
            .unwrap();
        assert!(name.ends_with(".png"));

        let bytes = store.fetch(&name).await.unwrap();
        assert_eq!(bytes, Some(b"pngdata".to_vec()));
    }

    #[tokio::test]
    async fn test_rejects_unknown_type_and_empty() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(store
            .store_upload(b"x".to_vec(), "text/html")
            .await
            .is_err());
        assert!(store.store_upload(vec![], "image/png").await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let dir = tempdir().unwrap();
        let config = test_config();
        let mut storage = config.storage.clone();
        storage.image_upload_limit = 4;
        let store = ImageStore::new(
            Arc::new(DiskImageBackend::new(dir.path().to_path_buf())),
            &storage,
            &config.service,
        );

        let err = store
            .store_upload(b"12345".to_vec(), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_url_for() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(
            store.url_for("abc.png"),
            "http://localhost:8000/api/v1/images/abc.png"
        );
        // Federated picture URLs are stored whole and must not be rewritten
        assert_eq!(
            store.url_for("https://lh3.googleusercontent.com/a/pic"),
            "https://lh3.googleusercontent.com/a/pic"
        );
    }
}
