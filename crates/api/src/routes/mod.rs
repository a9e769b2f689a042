//! API route definitions.

pub mod files;
