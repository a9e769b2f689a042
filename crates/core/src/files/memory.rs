//! In-process metadata store.

use async_trait::async_trait;
use dashmap::DashMap;
use tether_shared::FileId;

use super::error::RepositoryError;
use super::ports::FileRepository;
use super::types::FileRecord;

/// [`FileRepository`] held in process memory.
///
/// One ordered list per tenant. Contents are lost when the value is dropped;
/// share a single instance through `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryFileRepository {
    tenants: DashMap<String, Vec<FileRecord>>,
}

impl InMemoryFileRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn list_by(
        &self,
        tenant: &str,
        reference_id: &str,
    ) -> Result<Vec<FileRecord>, RepositoryError> {
        Ok(self
            .tenants
            .get(tenant)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.reference_id == reference_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_all(&self, tenant: &str) -> Result<Vec<FileRecord>, RepositoryError> {
        Ok(self
            .tenants
            .get(tenant)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }

    async fn read_by(
        &self,
        tenant: &str,
        file_id: FileId,
    ) -> Result<Option<FileRecord>, RepositoryError> {
        Ok(self
            .tenants
            .get(tenant)
            .and_then(|records| records.iter().find(|r| r.id == file_id).cloned()))
    }

    async fn add(&self, tenant: &str, record: FileRecord) -> Result<(), RepositoryError> {
        let mut records = self.tenants.entry(tenant.to_string()).or_default();
        if records.iter().any(|r| r.id == record.id) {
            return Err(RepositoryError::Duplicate(record.id));
        }
        records.push(record);
        Ok(())
    }

    async fn delete(&self, tenant: &str, file_id: FileId) -> Result<(), RepositoryError> {
        if let Some(mut records) = self.tenants.get_mut(tenant) {
            records.retain(|r| r.id != file_id);
        }
        Ok(())
    }
}
