// src/storage/s3.rs

//! AWS S3 storage implementation.
//!
//! Partition files land in the data lake bucket; the same backend also
//! serves account cookie files from a separate bucket.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::storage::ObjectStore;

/// S3-backed object store for one bucket.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create S3 storage for `bucket` from the ambient AWS configuration.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket)
    }

    /// Same client, another bucket.
    pub fn with_bucket(&self, bucket: impl Into<String>) -> Self {
        Self::new(self.client.clone(), bucket)
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/vnd.apache.parquet")
            .send()
            .await
            .map_err(|e| AppError::S3(e.into_service_error().to_string()))?;

        let location = self.location(key);
        log::info!("Wrote {} bytes to {}", size, location);
        Ok(location)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                // Check if it's a "not found" error
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No object at {}", self.location(key));
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
