//! File lifecycle types.

use serde::{Deserialize, Serialize};
use tether_shared::FileId;

/// Persisted metadata of a stored file.
///
/// Scoped by tenant; the tenant is the partition the record lives in, not a
/// field of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique within the tenant.
    pub id: FileId,
    /// Name of the blob, unique within the tenant's storage namespace.
    pub file_name: String,
    /// Business object the file is attached to.
    pub reference_id: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    /// Who uploaded the file.
    pub creator_id: String,
}

/// A file as presented to readers, with a fresh download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File id.
    pub id: FileId,
    /// File name.
    pub file_name: String,
    /// Time-limited signed download URL.
    pub url: String,
}

/// Input for an upload. The content stream is consumed once.
#[derive(Debug)]
pub struct UploadFileCommand<R> {
    /// Uploader.
    pub creator_id: String,
    /// Target file name.
    pub file_name: String,
    /// Business object to attach to.
    pub reference_id: String,
    /// File contents.
    pub content: R,
}

/// How download URLs are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlPolicy {
    /// Validity window in minutes.
    pub expiry_minutes: u32,
    /// Issue `http://` instead of `https://`.
    pub insecure: bool,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            expiry_minutes: 15,
            insecure: false,
        }
    }
}
