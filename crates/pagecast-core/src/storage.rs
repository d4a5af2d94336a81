//! Storage layer for the catalog and page images
//!
//! Provides an object-store seam and its AWS S3 / S3-compatible implementation.

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error retrieving object from S3
    #[error("S3 Get error: {0}")]
    S3Get(Box<SdkError<GetObjectError>>),
    /// Error building a presigned request
    #[error("S3 presign error: {0}")]
    Presign(String),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration error (missing bucket, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Interface for object storage providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the full body of an object
    async fn fetch_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;
    /// Produce a time-limited GET URL for an object without fetching it
    async fn sign_get_url(&self, key: &str, expiry: Duration) -> Result<String, StorageError>;
}

/// Connection parameters for [`S3Store`]
#[derive(Debug, Clone, Default)]
pub struct S3Options {
    /// Bucket holding the catalog and page images
    pub bucket: String,
    /// Endpoint override for S3-compatible services
    pub endpoint_url: Option<String>,
    /// Region override; otherwise resolved by the default AWS chain
    pub region: Option<String>,
}

/// S3-backed object store
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 store; credentials come from the default AWS provider chain
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket name is empty.
    pub async fn new(options: &S3Options) -> Result<Self, StorageError> {
        if options.bucket.trim().is_empty() {
            return Err(StorageError::Config("AWS_S3_BUCKET_NAME is missing".into()));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &options.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &options.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint_url).force_path_style(true);
        }

        Ok(Self::from_client(
            Client::from_conf(s3_config.build()),
            options.bucket.clone(),
        ))
    }

    /// Wrap an already configured client
    #[must_use]
    pub const fn from_client(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Bucket this store reads from
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn fetch_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        debug!(bucket = %self.bucket, key, "Fetching object");
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3Get(Box::new(e)))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
            .into_bytes();

        Ok(data.to_vec())
    }

    async fn sign_get_url(&self, key: &str, expiry: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expiry)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        // Signing is local; `presigned` never sends the request.
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        debug!(key, expiry_secs = expiry.as_secs(), "Presigned page URL");
        Ok(request.uri().to_string())
    }
}
