//! S3-compatible object storage (MinIO in deployment).

use super::{ObjectStore, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::{debug, info};

pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    /// Path-style addressing against a custom endpoint, as MinIO expects.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Client(e.to_string()))?;

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Client(e.to_string()))?
            .with_path_style();

        info!(endpoint = %config.endpoint, bucket = %config.bucket, "Object storage configured");
        Ok(Self { bucket })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        debug!(bucket = %self.bucket.name(), key, "Fetching object");

        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| match e {
                S3Error::HttpFailWithBody(404, _) => StorageError::NotFound(key.to_string()),
                other => StorageError::Client(other.to_string()),
            })?;

        match response.status_code() {
            200..=299 => Ok(response.bytes().to_vec()),
            404 => Err(StorageError::NotFound(key.to_string())),
            status => Err(StorageError::Client(format!(
                "unexpected status {status} for {key}"
            ))),
        }
    }
}
