//! Metadata store and identity ports.

use async_trait::async_trait;
use tether_shared::FileId;

use super::error::RepositoryError;
use super::types::FileRecord;

/// Tenant-partitioned store of file records.
///
/// Implemented here in memory and by the db crate against SQL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Records of the tenant attached to `reference_id`, in insertion order.
    /// An unknown tenant or reference yields an empty list.
    async fn list_by(
        &self,
        tenant: &str,
        reference_id: &str,
    ) -> Result<Vec<FileRecord>, RepositoryError>;

    /// Every record of the tenant, in insertion order.
    async fn list_all(&self, tenant: &str) -> Result<Vec<FileRecord>, RepositoryError>;

    /// Record by id; `Ok(None)` when absent.
    async fn read_by(
        &self,
        tenant: &str,
        file_id: FileId,
    ) -> Result<Option<FileRecord>, RepositoryError>;

    /// Persist a new record.
    ///
    /// Fails with `Duplicate` if the id is already taken in the tenant.
    async fn add(&self, tenant: &str, record: FileRecord) -> Result<(), RepositoryError>;

    /// Remove a record. Removing an absent id is not an error.
    async fn delete(&self, tenant: &str, file_id: FileId) -> Result<(), RepositoryError>;
}

/// Source of fresh file ids.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    /// A new id, distinct from every id handed out before.
    fn make_id(&self) -> FileId;
}

/// Random UUID v4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn make_id(&self) -> FileId {
        FileId::new()
    }
}
