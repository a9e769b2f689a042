//! File metadata repository for database operations.
//!
//! Implements the core `FileRepository` port using SeaORM.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use tether_core::files::{FileRecord, FileRepository, RepositoryError};
use tether_shared::FileId;

use crate::entities::files;

/// File repository implementation.
#[derive(Debug, Clone)]
pub struct SeaOrmFileRepository {
    db: DatabaseConnection,
}

impl SeaOrmFileRepository {
    /// Create a new file repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileRepository for SeaOrmFileRepository {
    async fn list_by(
        &self,
        tenant: &str,
        reference_id: &str,
    ) -> Result<Vec<FileRecord>, RepositoryError> {
        let models = files::Entity::find()
            .filter(files::Column::Tenant.eq(tenant))
            .filter(files::Column::ReferenceId.eq(reference_id))
            .order_by_asc(files::Column::Seq)
            .all(&self.db)
            .await
            .map_err(backend)?;

        models.into_iter().map(to_domain).collect()
    }

    async fn list_all(&self, tenant: &str) -> Result<Vec<FileRecord>, RepositoryError> {
        let models = files::Entity::find()
            .filter(files::Column::Tenant.eq(tenant))
            .order_by_asc(files::Column::Seq)
            .all(&self.db)
            .await
            .map_err(backend)?;

        models.into_iter().map(to_domain).collect()
    }

    async fn read_by(
        &self,
        tenant: &str,
        file_id: FileId,
    ) -> Result<Option<FileRecord>, RepositoryError> {
        let model = files::Entity::find()
            .filter(files::Column::Tenant.eq(tenant))
            .filter(files::Column::FileId.eq(file_id.to_string()))
            .one(&self.db)
            .await
            .map_err(backend)?;

        model.map(to_domain).transpose()
    }

    async fn add(&self, tenant: &str, record: FileRecord) -> Result<(), RepositoryError> {
        let active_model = files::ActiveModel {
            tenant: Set(tenant.to_string()),
            file_id: Set(record.id.to_string()),
            file_name: Set(record.file_name),
            reference_id: Set(record.reference_id),
            created_at: Set(record.created_at),
            creator_id: Set(record.creator_id),
            ..Default::default()
        };

        active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                RepositoryError::Duplicate(record.id)
            } else {
                backend(e)
            }
        })?;
        Ok(())
    }

    async fn delete(&self, tenant: &str, file_id: FileId) -> Result<(), RepositoryError> {
        files::Entity::delete_many()
            .filter(files::Column::Tenant.eq(tenant))
            .filter(files::Column::FileId.eq(file_id.to_string()))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn backend(err: DbErr) -> RepositoryError {
    RepositoryError::backend(err.to_string())
}

/// Convert a database row to the domain record.
fn to_domain(model: files::Model) -> Result<FileRecord, RepositoryError> {
    let id = model.file_id.parse::<FileId>().map_err(|e| {
        RepositoryError::backend(format!("corrupt file id '{}': {e}", model.file_id))
    })?;

    Ok(FileRecord {
        id,
        file_name: model.file_name,
        reference_id: model.reference_id,
        created_at: model.created_at,
        creator_id: model.creator_id,
    })
}
