//! File lifecycle use case.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::try_join_all;
use tether_shared::FileId;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::error::FileError;
use super::ports::{FileRepository, IdGenerator};
use super::types::{Attachment, FileRecord, UploadFileCommand, UrlPolicy};
use crate::clock::Clock;
use crate::storage::{BlobStorage, StorageError};

const UPLOAD: &str = "upload_file";
const LIST: &str = "list_attachments";
const DELETE: &str = "delete_file";
const ORPHANS: &str = "find_orphan_blobs";
const READ: &str = "read_blob";

/// Uploads, lists and deletes tenant files.
///
/// A record only exists while its blob does: uploads write the blob before
/// the record, deletes remove the record before the blob. A failure between
/// the two steps leaves an orphan blob, which is logged and reported by
/// [`FileService::find_orphan_blobs`] but never cleaned up automatically.
pub struct FileService {
    storage: Arc<dyn BlobStorage>,
    repo: Arc<dyn FileRepository>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    urls: UrlPolicy,
}

impl FileService {
    /// Create a new file service.
    #[must_use]
    pub fn new(
        storage: Arc<dyn BlobStorage>,
        repo: Arc<dyn FileRepository>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        urls: UrlPolicy,
    ) -> Self {
        Self {
            storage,
            repo,
            ids,
            clock,
            urls,
        }
    }

    /// Store a new file and record its metadata.
    ///
    /// # Errors
    ///
    /// - `InputValidationFailed` for an empty tenant, file name or reference
    ///   id, an unusable file name, or an unreadable stream
    /// - `StorageWriteFailed` if the name is taken or the write fails
    /// - `MetadataWriteFailed` if the record cannot be stored (the blob stays)
    /// - `Cancelled` if `cancel` fires first
    pub async fn upload_file<R>(
        &self,
        tenant: &str,
        command: UploadFileCommand<R>,
        cancel: &CancellationToken,
    ) -> Result<FileRecord, FileError>
    where
        R: AsyncRead + Unpin + Send,
    {
        cancellable(cancel, UPLOAD, self.upload(tenant, command)).await
    }

    /// Attachments of a business object, each with a fresh download URL.
    ///
    /// # Errors
    ///
    /// - `MetadataReadFailed` if the store cannot be read
    /// - `UrlIssuanceFailed` if any URL cannot be issued; no partial result
    /// - `Cancelled` if `cancel` fires first
    pub async fn list_attachments(
        &self,
        tenant: &str,
        reference_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Attachment>, FileError> {
        cancellable(cancel, LIST, self.list(tenant, reference_id)).await
    }

    /// Remove a file's record, then its blob.
    ///
    /// # Errors
    ///
    /// - `MetadataNotFound` if no such file exists in the tenant
    /// - `MetadataReadFailed` / `MetadataWriteFailed` on store failures
    /// - `StorageDeleteFailed` if the blob survives (the record is gone)
    /// - `Cancelled` if `cancel` fires first
    pub async fn delete_file(
        &self,
        tenant: &str,
        file_id: FileId,
        cancel: &CancellationToken,
    ) -> Result<(), FileError> {
        cancellable(cancel, DELETE, self.delete(tenant, file_id)).await
    }

    /// Names of the tenant's blobs that have no metadata record.
    ///
    /// Read-only; nothing is deleted.
    ///
    /// # Errors
    ///
    /// `StorageReadFailed` or `MetadataReadFailed` when either side cannot be listed.
    pub async fn find_orphan_blobs(
        &self,
        tenant: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, FileError> {
        cancellable(cancel, ORPHANS, self.orphans(tenant)).await
    }

    /// Contents of a stored blob.
    ///
    /// # Errors
    ///
    /// `StorageReadFailed` if the blob is missing or unreadable.
    pub async fn read_blob(
        &self,
        tenant: &str,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Bytes, FileError> {
        cancellable(cancel, READ, async {
            self.storage
                .read_file(tenant, file_name)
                .await
                .map_err(|source| storage_error(READ, source, |operation, source| {
                    FileError::StorageReadFailed { operation, source }
                }))
        })
        .await
    }

    async fn upload<R>(
        &self,
        tenant: &str,
        mut command: UploadFileCommand<R>,
    ) -> Result<FileRecord, FileError>
    where
        R: AsyncRead + Unpin + Send,
    {
        require(UPLOAD, "tenant", tenant)?;
        require(UPLOAD, "file name", &command.file_name)?;
        require(UPLOAD, "reference id", &command.reference_id)?;

        let mut content = Vec::new();
        command
            .content
            .read_to_end(&mut content)
            .await
            .map_err(|e| FileError::validation(UPLOAD, format!("could not read file content: {e}")))?;
        let size = content.len();

        self.storage
            .upload_file(tenant, &command.file_name, Bytes::from(content))
            .await
            .map_err(|source| {
                storage_error(UPLOAD, source, |operation, source| {
                    FileError::StorageWriteFailed { operation, source }
                })
            })?;

        let record = FileRecord {
            id: self.ids.make_id(),
            file_name: command.file_name,
            reference_id: command.reference_id,
            created_at: self.clock.now().timestamp(),
            creator_id: command.creator_id,
        };

        if let Err(source) = self.repo.add(tenant, record.clone()).await {
            warn!(
                tenant = %tenant,
                file_name = %record.file_name,
                error = %source,
                "Metadata write failed after blob upload; blob is orphaned"
            );
            return Err(FileError::MetadataWriteFailed {
                operation: UPLOAD,
                source,
            });
        }

        info!(
            tenant = %tenant,
            file_id = %record.id,
            file_name = %record.file_name,
            reference_id = %record.reference_id,
            size,
            "File uploaded"
        );
        Ok(record)
    }

    async fn list(&self, tenant: &str, reference_id: &str) -> Result<Vec<Attachment>, FileError> {
        require(LIST, "tenant", tenant)?;

        let records = self
            .repo
            .list_by(tenant, reference_id)
            .await
            .map_err(|source| FileError::MetadataReadFailed {
                operation: LIST,
                source,
            })?;

        try_join_all(records.into_iter().map(|record| async move {
            let url = self
                .storage
                .get_expiring_url(
                    tenant,
                    &record.file_name,
                    self.urls.expiry_minutes,
                    self.urls.insecure,
                )
                .await
                .map_err(|source| FileError::UrlIssuanceFailed {
                    operation: LIST,
                    source,
                })?;
            Ok(Attachment {
                id: record.id,
                file_name: record.file_name,
                url,
            })
        }))
        .await
    }

    async fn delete(&self, tenant: &str, file_id: FileId) -> Result<(), FileError> {
        require(DELETE, "tenant", tenant)?;

        let record = self
            .repo
            .read_by(tenant, file_id)
            .await
            .map_err(|source| FileError::MetadataReadFailed {
                operation: DELETE,
                source,
            })?
            .ok_or(FileError::MetadataNotFound {
                operation: DELETE,
                file_id,
            })?;

        self.repo
            .delete(tenant, file_id)
            .await
            .map_err(|source| FileError::MetadataWriteFailed {
                operation: DELETE,
                source,
            })?;

        if let Err(source) = self.storage.delete_file(tenant, &record.file_name).await {
            warn!(
                tenant = %tenant,
                file_id = %file_id,
                file_name = %record.file_name,
                error = %source,
                "Blob delete failed after metadata removal; blob is orphaned"
            );
            return Err(FileError::StorageDeleteFailed {
                operation: DELETE,
                source,
            });
        }

        info!(tenant = %tenant, file_id = %file_id, file_name = %record.file_name, "File deleted");
        Ok(())
    }

    async fn orphans(&self, tenant: &str) -> Result<Vec<String>, FileError> {
        require(ORPHANS, "tenant", tenant)?;

        let blobs = self.storage.list_files(tenant).await.map_err(|source| {
            storage_error(ORPHANS, source, |operation, source| {
                FileError::StorageReadFailed { operation, source }
            })
        })?;
        let known: HashSet<String> = self
            .repo
            .list_all(tenant)
            .await
            .map_err(|source| FileError::MetadataReadFailed {
                operation: ORPHANS,
                source,
            })?
            .into_iter()
            .map(|record| record.file_name)
            .collect();

        Ok(blobs.into_iter().filter(|name| !known.contains(name)).collect())
    }
}

/// Race `fut` against `cancel`, preferring cancellation.
async fn cancellable<T, F>(
    cancel: &CancellationToken,
    operation: &'static str,
    fut: F,
) -> Result<T, FileError>
where
    F: Future<Output = Result<T, FileError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(FileError::Cancelled { operation }),
        res = fut => res,
    }
}

fn require(operation: &'static str, field: &str, value: &str) -> Result<(), FileError> {
    if value.trim().is_empty() {
        return Err(FileError::validation(operation, format!("{field} is empty")));
    }
    Ok(())
}

/// Bad names are the caller's fault; everything else goes to `wrap`.
fn storage_error(
    operation: &'static str,
    source: StorageError,
    wrap: impl FnOnce(&'static str, StorageError) -> FileError,
) -> FileError {
    match source {
        StorageError::InvalidKey(reason) => FileError::validation(operation, reason),
        source => wrap(operation, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::files::error::RepositoryError;
    use crate::files::memory::InMemoryFileRepository;
    use crate::files::ports::{MockFileRepository, UuidIdGenerator};
    use crate::storage::{
        MockBlobStorage, OpenDalBlobStorage, SignedQuery, StorageConfig, StorageProvider,
    };
    use chrono::{TimeZone, Utc};
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    const NOW: i64 = 1_772_355_600; // 2026-03-01T09:00:00Z

    struct Fixture {
        service: FileService,
        storage: Arc<OpenDalBlobStorage>,
        repo: Arc<InMemoryFileRepository>,
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.timestamp_opt(NOW, 0).unwrap()))
    }

    fn memory_storage() -> Arc<OpenDalBlobStorage> {
        let config = StorageConfig::new(StorageProvider::Memory).with_signing_secret("secret");
        Arc::new(OpenDalBlobStorage::from_config(&config, clock()).unwrap())
    }

    fn fixture() -> Fixture {
        let storage = memory_storage();
        let repo = Arc::new(InMemoryFileRepository::new());
        let service = FileService::new(
            storage.clone(),
            repo.clone(),
            Arc::new(UuidIdGenerator),
            clock(),
            UrlPolicy::default(),
        );
        Fixture {
            service,
            storage,
            repo,
        }
    }

    fn command<'a>(file_name: &str, reference_id: &str, content: &'a [u8]) -> UploadFileCommand<&'a [u8]> {
        UploadFileCommand {
            creator_id: "u1".to_string(),
            file_name: file_name.to_string(),
            reference_id: reference_id.to_string(),
            content,
        }
    }

    fn record(file_name: &str) -> FileRecord {
        FileRecord {
            id: FileId::new(),
            file_name: file_name.to_string(),
            reference_id: "R1".to_string(),
            created_at: NOW,
            creator_id: "u1".to_string(),
        }
    }

    /// Decode the signed query of a locally issued URL.
    fn signed_query(url: &str) -> (String, String, SignedQuery) {
        let (path, query) = url.split_once('?').unwrap();
        let mut segments = path.rsplit('/');
        let file_name = urlencoding::decode(segments.next().unwrap()).unwrap().into_owned();
        let tenant = urlencoding::decode(segments.next().unwrap()).unwrap().into_owned();
        let param = |name: &str| {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
                .map(|v| urlencoding::decode(v).unwrap().into_owned())
                .unwrap()
        };
        let query = SignedQuery {
            expires: param("expires").parse().unwrap(),
            content_disposition: param("response-content-disposition"),
            content_type: param("response-content-type"),
            signature: param("signature"),
        };
        (tenant, file_name, query)
    }

    struct PendingReader;

    impl AsyncRead for PendingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Pending
        }
    }

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")))
        }
    }

    #[tokio::test]
    async fn test_upload_list_download_delete_scenario() {
        let f = fixture();
        let cancel = CancellationToken::new();

        let created = f
            .service
            .upload_file("T", command("a.txt", "R1", b"hello"), &cancel)
            .await
            .unwrap();
        assert_eq!(created.file_name, "a.txt");
        assert_eq!(created.created_at, NOW);

        let attachments = f.service.list_attachments("T", "R1", &cancel).await.unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].id, created.id);
        assert_eq!(attachments[0].file_name, "a.txt");

        let (tenant, file_name, query) = signed_query(&attachments[0].url);
        let signer = f.storage.local_signer().unwrap();
        signer.verify(&tenant, &file_name, &query).unwrap();
        assert_eq!(query.content_disposition, "attachment");
        let body = f.service.read_blob(&tenant, &file_name, &cancel).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"hello"));

        f.service.delete_file("T", created.id, &cancel).await.unwrap();
        assert!(f.service.list_attachments("T", "R1", &cancel).await.unwrap().is_empty());
        assert!(!f.storage.exists("T", "a.txt").await.unwrap());

        let err = f.service.delete_file("T", created.id, &cancel).await.unwrap_err();
        assert!(matches!(err, FileError::MetadataNotFound { operation: "delete_file", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts_and_keeps_first_blob() {
        let f = fixture();
        let cancel = CancellationToken::new();

        f.service
            .upload_file("T", command("a.txt", "R1", b"first"), &cancel)
            .await
            .unwrap();
        let err = f
            .service
            .upload_file("T", command("a.txt", "R2", b"second"), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert!(matches!(err, FileError::StorageWriteFailed { operation: "upload_file", .. }));
        assert_eq!(
            f.storage.read_file("T", "a.txt").await.unwrap(),
            Bytes::from_static(b"first")
        );
        assert!(f.repo.list_by("T", "R2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_name_in_two_tenants() {
        let f = fixture();
        let cancel = CancellationToken::new();

        f.service
            .upload_file("T1", command("a.txt", "R1", b"one"), &cancel)
            .await
            .unwrap();
        f.service
            .upload_file("T2", command("a.txt", "R1", b"two"), &cancel)
            .await
            .unwrap();

        let t1 = f.service.list_attachments("T1", "R1", &cancel).await.unwrap();
        assert_eq!(t1.len(), 1);
        assert!(t1[0].url.contains("/T1/a.txt?"));
    }

    #[tokio::test]
    async fn test_list_unknown_reference_is_empty() {
        let f = fixture();
        let attachments = f
            .service
            .list_attachments("T", "nothing-here", &CancellationToken::new())
            .await
            .unwrap();
        assert!(attachments.is_empty());
    }

    #[tokio::test]
    async fn test_list_preserves_upload_order() {
        let f = fixture();
        let cancel = CancellationToken::new();
        for name in ["c.txt", "a.txt", "b.txt"] {
            f.service
                .upload_file("T", command(name, "R1", b"x"), &cancel)
                .await
                .unwrap();
        }

        let names: Vec<_> = f
            .service
            .list_attachments("T", "R1", &cancel)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.file_name)
            .collect();
        assert_eq!(names, vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let f = fixture();
        let cancel = CancellationToken::new();

        for cmd in [
            command("", "R1", b"x"),
            command("a.txt", "", b"x"),
            command("  ", "R1", b"x"),
            command("dir/a.txt", "R1", b"x"),
        ] {
            let err = f.service.upload_file("T", cmd, &cancel).await.unwrap_err();
            assert!(
                matches!(err, FileError::InputValidationFailed { .. }),
                "unexpected {err:?}"
            );
        }

        let err = f
            .service
            .upload_file("", command("a.txt", "R1", b"x"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::InputValidationFailed { .. }));
        assert!(f.storage.list_files("T").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_stream_is_rejected() {
        let f = fixture();
        let cmd = UploadFileCommand {
            creator_id: "u1".to_string(),
            file_name: "a.txt".to_string(),
            reference_id: "R1".to_string(),
            content: BrokenReader,
        };
        let err = f
            .service
            .upload_file("T", cmd, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::InputValidationFailed { .. }));
        assert!(!f.storage.exists("T", "a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_orphan_blob() {
        let storage = memory_storage();
        let mut repo = MockFileRepository::new();
        repo.expect_add()
            .returning(|_, _| Err(RepositoryError::backend("disk full")));
        repo.expect_list_all().returning(|_| Ok(Vec::new()));

        let service = FileService::new(
            storage.clone(),
            Arc::new(repo),
            Arc::new(UuidIdGenerator),
            clock(),
            UrlPolicy::default(),
        );
        let cancel = CancellationToken::new();

        let err = service
            .upload_file("T", command("a.txt", "R1", b"hello"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::MetadataWriteFailed { operation: "upload_file", .. }));
        assert!(storage.exists("T", "a.txt").await.unwrap());
        assert_eq!(
            service.find_orphan_blobs("T", &cancel).await.unwrap(),
            vec!["a.txt"]
        );
    }

    #[tokio::test]
    async fn test_list_fails_fast_on_url_error() {
        let mut storage = MockBlobStorage::new();
        storage
            .expect_get_expiring_url()
            .returning(|_, file_name, _, _| {
                if file_name == "bad.txt" {
                    Err(StorageError::operation("signing key revoked"))
                } else {
                    Ok(format!("https://example.com/{file_name}"))
                }
            });

        let repo = InMemoryFileRepository::new();
        repo.add("T", record("good.txt")).await.unwrap();
        repo.add("T", record("bad.txt")).await.unwrap();

        let service = FileService::new(
            Arc::new(storage),
            Arc::new(repo),
            Arc::new(UuidIdGenerator),
            clock(),
            UrlPolicy::default(),
        );

        let err = service
            .list_attachments("T", "R1", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::UrlIssuanceFailed { operation: "list_attachments", .. }));
    }

    #[tokio::test]
    async fn test_list_passes_url_policy() {
        let mut storage = MockBlobStorage::new();
        storage
            .expect_get_expiring_url()
            .withf(|tenant, file_name, expiry, insecure| {
                tenant == "T" && file_name == "a.txt" && *expiry == 5 && *insecure
            })
            .times(1)
            .returning(|_, _, _, _| Ok("http://example.com/a.txt".to_string()));

        let repo = InMemoryFileRepository::new();
        repo.add("T", record("a.txt")).await.unwrap();

        let policy = UrlPolicy {
            expiry_minutes: 5,
            insecure: true,
        };
        let service = FileService::new(
            Arc::new(storage),
            Arc::new(repo),
            Arc::new(UuidIdGenerator),
            clock(),
            policy,
        );

        let attachments = service
            .list_attachments("T", "R1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(attachments[0].url, "http://example.com/a.txt");
    }

    #[tokio::test]
    async fn test_delete_unknown_id_touches_nothing() {
        // no expectations: any storage call panics
        let storage = MockBlobStorage::new();
        let repo = Arc::new(InMemoryFileRepository::new());
        let kept = record("keep.txt");
        repo.add("T", kept.clone()).await.unwrap();

        let service = FileService::new(
            Arc::new(storage),
            repo.clone(),
            Arc::new(UuidIdGenerator),
            clock(),
            UrlPolicy::default(),
        );

        let unknown = FileId::new();
        let err = service
            .delete_file("T", unknown, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::MetadataNotFound { file_id, .. } if file_id == unknown));
        assert_eq!(repo.list_all("T").await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_delete_blob_failure_after_metadata_removed() {
        let mut storage = MockBlobStorage::new();
        storage
            .expect_delete_file()
            .times(1)
            .returning(|_, _| Err(StorageError::operation("bucket unreachable")));

        let repo = Arc::new(InMemoryFileRepository::new());
        let doomed = record("a.txt");
        repo.add("T", doomed.clone()).await.unwrap();

        let service = FileService::new(
            Arc::new(storage),
            repo.clone(),
            Arc::new(UuidIdGenerator),
            clock(),
            UrlPolicy::default(),
        );

        let err = service
            .delete_file("T", doomed.id, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::StorageDeleteFailed { operation: "delete_file", .. }));
        assert!(repo.read_by("T", doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_come_from_generator() {
        let fixed = FileId::new();
        let mut ids = crate::files::ports::MockIdGenerator::new();
        ids.expect_make_id().times(1).return_const(fixed);

        let service = FileService::new(
            memory_storage(),
            Arc::new(InMemoryFileRepository::new()),
            Arc::new(ids),
            clock(),
            UrlPolicy::default(),
        );
        let created = service
            .upload_file("T", command("a.txt", "R1", b"x"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(created.id, fixed);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let f = fixture();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = f
            .service
            .upload_file("T", command("a.txt", "R1", b"x"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Cancelled { operation: "upload_file" }));
        assert!(!f.storage.exists("T", "a.txt").await.unwrap());

        let err = f.service.list_attachments("T", "R1", &cancel).await.unwrap_err();
        assert!(matches!(err, FileError::Cancelled { operation: "list_attachments" }));

        let err = f.service.delete_file("T", FileId::new(), &cancel).await.unwrap_err();
        assert!(matches!(err, FileError::Cancelled { operation: "delete_file" }));
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_read() {
        let f = fixture();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let cmd = UploadFileCommand {
            creator_id: "u1".to_string(),
            file_name: "a.txt".to_string(),
            reference_id: "R1".to_string(),
            content: PendingReader,
        };
        let err = f.service.upload_file("T", cmd, &cancel).await.unwrap_err();
        assert!(matches!(err, FileError::Cancelled { .. }));
        assert!(!f.storage.exists("T", "a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_orphan_report_ignores_tracked_blobs() {
        let f = fixture();
        let cancel = CancellationToken::new();
        f.service
            .upload_file("T", command("tracked.txt", "R1", b"x"), &cancel)
            .await
            .unwrap();
        f.storage
            .upload_file("T", "stray.bin", Bytes::from_static(b"y"))
            .await
            .unwrap();

        assert_eq!(
            f.service.find_orphan_blobs("T", &cancel).await.unwrap(),
            vec!["stray.bin"]
        );
        assert!(f.service.find_orphan_blobs("other", &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_blob() {
        let f = fixture();
        let err = f
            .service
            .read_blob("T", "missing.txt", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileError::StorageReadFailed { source: StorageError::NotFound { .. }, .. }
        ));
    }
}
