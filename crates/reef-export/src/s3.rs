//! S3-compatible storage backend for product export.
//!
//! Wires the `object_store` S3 client into the synchronous zarrs storage
//! API so the same sink code serves local directories and object storage.
//! Works against AWS S3 and MinIO-style endpoints.

use std::sync::Arc;

// Use the direct object_store crate (version must match what zarrs_object_store uses)
use object_store::aws::AmazonS3Builder;
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};

use crate::error::{ExportError, Result};

/// Blocking executor that works from within a tokio runtime.
///
/// Uses `tokio::task::block_in_place` to move the current task to a blocking
/// thread, then uses the runtime handle to drive the future. Requires the
/// multi-thread runtime flavor.
#[derive(Clone, Copy)]
pub struct TokioBlockOn;

impl AsyncToSyncBlockOn for TokioBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        // block_in_place hands the worker thread back to the scheduler so
        // driving the future here cannot stall the runtime
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
    }
}

/// Configuration for connecting to S3-compatible storage.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Custom endpoint URL for MinIO-style deployments; `None` for AWS.
    pub endpoint: Option<String>,
    /// Bucket holding the product dataset.
    pub bucket: String,
    /// Access key ID; empty to rely on ambient credentials.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Bucket region.
    pub region: String,
    /// Allow HTTP (required for local MinIO).
    pub allow_http: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: "reef-products".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: "ap-southeast-2".to_string(),
            allow_http: false,
        }
    }
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "reef-products".to_string()),
            access_key_id: std::env::var("S3_ACCESS_KEY").unwrap_or_default(),
            secret_access_key: std::env::var("S3_SECRET_KEY").unwrap_or_default(),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
            allow_http: std::env::var("S3_ALLOW_HTTP")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Storage type alias for S3-backed Zarr access (async).
pub type AsyncS3Storage = AsyncObjectStore<object_store::aws::AmazonS3>;

/// Storage type alias for S3-backed Zarr access (sync adapter).
///
/// Implements the readable and writable storage traits, so it plugs into
/// [`crate::ZarrExportSink`] and [`crate::BaselineStore`] directly.
pub type S3Storage = AsyncToSyncStorageAdapter<AsyncS3Storage, TokioBlockOn>;

/// Create an S3-compatible storage backend for Zarr access.
///
/// Builds an `object_store` client from the config, wraps it in
/// `AsyncObjectStore`, and adapts it to the synchronous zarrs API.
pub fn create_s3_storage(config: &S3Config) -> Result<Arc<S3Storage>> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .with_allow_http(config.allow_http);

    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    if !config.access_key_id.is_empty() {
        builder = builder
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key);
    }

    let s3 = builder
        .build()
        .map_err(|e| ExportError::Config(format!("failed to create S3 client: {}", e)))?;

    let async_store = Arc::new(AsyncObjectStore::new(s3));
    let sync_store = AsyncToSyncStorageAdapter::new(async_store, TokioBlockOn);

    Ok(Arc::new(sync_store))
}
