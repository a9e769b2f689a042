//! Request extractors.

mod tenant;

pub use tenant::{CREATOR_HEADER, Creator, TENANT_HEADER, Tenant};
