/// Image storage system
///
/// Handles profile images and contractor documents. Uploads land in storage
/// before the owning database row is written; when the row write fails the
/// caller deletes the freshly stored image to avoid orphans.

pub mod disk;
pub mod store;

pub use disk::DiskImageBackend;
pub use store::ImageStore;

use crate::error::ApiResult;
use async_trait::async_trait;

/// Image storage backend trait
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Store image bytes under a name
    async fn put(&self, name: &str, data: Vec<u8>) -> ApiResult<()>;

    /// Retrieve image bytes by name
    async fn get(&self, name: &str) -> ApiResult<Option<Vec<u8>>>;

    /// Delete an image by name; deleting a missing image is not an error
    async fn delete(&self, name: &str) -> ApiResult<()>;

    /// Check if an image exists
    async fn exists(&self, name: &str) -> ApiResult<bool>;
}
