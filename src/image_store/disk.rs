/// Disk-based image storage backend
use crate::{
    error::{ApiError, ApiResult},
    image_store::ImageBackend,
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores images on the local filesystem with directory sharding based on
/// name prefixes to prevent too many files in one directory.
#[derive(Clone)]
pub struct DiskImageBackend {
    base_path: PathBuf,
}

impl DiskImageBackend {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// File path for an image name: {base}/{first2chars}/{name}
    fn image_path(&self, name: &str) -> PathBuf {
        if name.len() >= 2 {
            let shard = &name[0..2];
            self.base_path.join(shard).join(name)
        } else {
            self.base_path.join("_").join(name)
        }
    }

    async fn ensure_image_dir(&self, name: &str) -> ApiResult<PathBuf> {
        let path = self.image_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ApiError::ImageStorage(format!("Failed to create image directory: {}", e))
            })?;
        }
        Ok(path)
    }
}

#[async_trait]
impl ImageBackend for DiskImageBackend {
    async fn put(&self, name: &str, data: Vec<u8>) -> ApiResult<()> {
        let path = self.ensure_image_dir(name).await?;

        fs::write(&path, data)
            .await
            .map_err(|e| ApiError::ImageStorage(format!("Failed to write image {}: {}", name, e)))?;

        Ok(())
    }

    async fn get(&self, name: &str) -> ApiResult<Option<Vec<u8>>> {
        match fs::read(self.image_path(name)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ApiError::ImageStorage(format!(
                "Failed to read image {}: {}",
                name, e
            ))),
        }
    }

    async fn delete(&self, name: &str) -> ApiResult<()> {
        match fs::remove_file(self.image_path(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::ImageStorage(format!(
                "Failed to delete image {}: {}",
                name, e
            ))),
        }
    }

    async fn exists(&self, name: &str) -> ApiResult<bool> {
        Ok(self.image_path(name).exists())
    }
}
