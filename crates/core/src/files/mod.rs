//! File attachment lifecycle.
//!
//! [`FileService`] uploads, lists and deletes tenant files on top of three
//! ports:
//! - [`crate::storage::BlobStorage`] for the bytes
//! - [`FileRepository`] for the metadata
//! - [`IdGenerator`] for file ids

mod error;
mod memory;
mod ports;
mod service;
mod types;

pub use error::{FileError, RepositoryError};
pub use memory::InMemoryFileRepository;
pub use ports::{FileRepository, IdGenerator, UuidIdGenerator};
pub use service::FileService;
pub use types::{Attachment, FileRecord, UploadFileCommand, UrlPolicy};
