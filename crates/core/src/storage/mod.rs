//! Blob storage for file attachments using Apache OpenDAL.
//!
//! Supported backends:
//! - Google Cloud Storage (including emulators)
//! - S3-compatible: Cloudflare R2, MinIO, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem and memory (development only)
//!
//! # Architecture
//!
//! [`BlobStorage`] is the port; [`OpenDalBlobStorage`] implements it:
//! - writes use `if_not_exists` when the backend has it, else an exists check
//! - download URLs are presigned by the backend or by [`LocalUrlSigner`]
//! - deletes and tenant listings go straight to the operator
//!
//! Objects live at `{tenant}/{file_name}`.

mod config;
mod error;
mod keys;
mod port;
mod service;
mod signer;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use keys::{ATTACHMENT_DISPOSITION, content_disposition, content_type_for, object_key};
pub use port::BlobStorage;
#[cfg(test)]
pub use port::MockBlobStorage;
pub use service::OpenDalBlobStorage;
pub use signer::{DOWNLOAD_PATH, LocalUrlSigner, SignatureError, SignedQuery};
