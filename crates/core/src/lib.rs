//! Core file lifecycle logic for Tether.
//!
//! This crate holds the use case and its ports with no web or database
//! dependencies. Adapters for SQL live in the db crate.
//!
//! # Modules
//!
//! - `files` - Upload, listing and deletion of tenant files
//! - `storage` - Blob storage port and its OpenDAL adapter
//! - `clock` - Injectable time source

pub mod clock;
pub mod files;
pub mod storage;
