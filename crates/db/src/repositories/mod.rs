//! Repository implementations for data access.
//!
//! Repositories implement the core ports, hiding the `SeaORM` implementation
//! details from the rest of the application.

pub mod file;

pub use file::SeaOrmFileRepository;
