pub mod memory;
pub mod minio;

pub use memory::MemoryStore;
pub use minio::S3Store;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("object storage client error: {0}")]
    Client(String),
}

/// Read-only view of the bucket holding vegetable photos and data exports.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Photos live under `images/` in the bucket.
pub fn image_key(filename: &str) -> String {
    format!("images/{filename}")
}

/// Public URL of a vegetable photo, as served by the storage endpoint.
pub fn public_image_url(public_base: &str, bucket: &str, vegetable_name: &str) -> String {
    format!(
        "{}/{}/images/{}",
        public_base.trim_end_matches('/'),
        bucket,
        urlencoding::encode(&format!("{vegetable_name}.jpg"))
    )
}
