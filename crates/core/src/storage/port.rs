//! Blob storage port.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;

/// Tenant-scoped object storage.
///
/// Objects are addressed by `(tenant, file_name)`. Implementations never
/// overwrite: uploading to a taken name fails with `AlreadyExists`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `content` under `{tenant}/{file_name}`.
    async fn upload_file(
        &self,
        tenant: &str,
        file_name: &str,
        content: Bytes,
    ) -> Result<(), StorageError>;

    /// Issue a time-limited download URL that forces attachment disposition.
    async fn get_expiring_url(
        &self,
        tenant: &str,
        file_name: &str,
        expiry_minutes: u32,
        insecure: bool,
    ) -> Result<String, StorageError>;

    /// Remove the object.
    async fn delete_file(&self, tenant: &str, file_name: &str) -> Result<(), StorageError>;

    /// Whether an object is stored under the name.
    async fn exists(&self, tenant: &str, file_name: &str) -> Result<bool, StorageError>;

    /// Fetch the object contents.
    async fn read_file(&self, tenant: &str, file_name: &str) -> Result<Bytes, StorageError>;

    /// Names of every object stored for the tenant.
    async fn list_files(&self, tenant: &str) -> Result<Vec<String>, StorageError>;

    /// Short backend name for logs.
    fn provider_name(&self) -> &'static str;
}
