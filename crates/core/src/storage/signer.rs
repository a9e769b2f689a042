//! HMAC-signed download URLs for backends without native presigning.
//!
//! The local filesystem and in-memory backends cannot mint presigned URLs,
//! so the service signs links to its own download route instead. The
//! signature covers the object key, the expiry and the response headers the
//! download will carry, so none of them can be altered by the holder.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use super::error::StorageError;
use super::keys::{ATTACHMENT_DISPOSITION, content_type_for, object_key};
use crate::clock::Clock;

type HmacSha256 = Hmac<Sha256>;

/// Route prefix the signed URLs point at.
pub const DOWNLOAD_PATH: &str = "/api/files/download";

/// Query parameters carried by a locally signed URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignedQuery {
    /// Unix timestamp (seconds) after which the URL is rejected.
    pub expires: i64,
    /// Disposition the download must be served with.
    #[serde(rename = "response-content-disposition")]
    pub content_disposition: String,
    /// Content type the download must be served with.
    #[serde(rename = "response-content-type")]
    pub content_type: String,
    /// Hex encoded HMAC-SHA256.
    pub signature: String,
}

/// Why a signed URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Signature is well-formed and authentic but past its expiry.
    #[error("signed url has expired")]
    Expired,
    /// Signature does not match the request.
    #[error("signature does not match")]
    Invalid,
}

/// Issues and verifies HMAC-signed download URLs.
pub struct LocalUrlSigner {
    mac: HmacSha256,
    public_host: String,
    clock: Arc<dyn Clock>,
}

impl LocalUrlSigner {
    /// Create a signer.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is empty.
    pub fn new(
        secret: impl AsRef<[u8]>,
        public_host: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorageError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(StorageError::configuration("signing secret is empty"));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| StorageError::configuration(e.to_string()))?;

        Ok(Self {
            mac,
            public_host: public_host.into(),
            clock,
        })
    }

    /// Issue a URL for `{tenant}/{file_name}` valid for `expiry_minutes`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the tenant or file name is not a valid key segment.
    pub fn sign(
        &self,
        tenant: &str,
        file_name: &str,
        expiry_minutes: u32,
        insecure: bool,
    ) -> Result<String, StorageError> {
        let key = object_key(tenant, file_name)?;
        let expires = self.clock.now().timestamp() + i64::from(expiry_minutes) * 60;
        let content_type = content_type_for(file_name);
        let signature = hex::encode(self.digest(&key, expires, ATTACHMENT_DISPOSITION, &content_type));
        let scheme = if insecure { "http" } else { "https" };

        Ok(format!(
            "{scheme}://{host}{path}/{tenant}/{file}?expires={expires}\
             &response-content-disposition={disposition}\
             &response-content-type={content_type}&signature={signature}",
            host = self.public_host,
            path = DOWNLOAD_PATH,
            tenant = urlencoding::encode(tenant),
            file = urlencoding::encode(file_name),
            disposition = urlencoding::encode(ATTACHMENT_DISPOSITION),
            content_type = urlencoding::encode(&content_type),
        ))
    }

    /// Check a presented URL for `{tenant}/{file_name}`.
    ///
    /// Authenticity is checked before expiry, so a forged URL is always
    /// reported as `Invalid`.
    ///
    /// # Errors
    ///
    /// `Invalid` for any mismatch, `Expired` once the clock passes `expires`.
    pub fn verify(
        &self,
        tenant: &str,
        file_name: &str,
        query: &SignedQuery,
    ) -> Result<(), SignatureError> {
        let key = object_key(tenant, file_name).map_err(|_| SignatureError::Invalid)?;
        let provided = hex::decode(&query.signature).map_err(|_| SignatureError::Invalid)?;

        let mut mac = self.mac.clone();
        mac.update(
            Self::message(
                &key,
                query.expires,
                &query.content_disposition,
                &query.content_type,
            )
            .as_bytes(),
        );
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if self.clock.now().timestamp() > query.expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    fn digest(&self, key: &str, expires: i64, disposition: &str, content_type: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(Self::message(key, expires, disposition, content_type).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn message(key: &str, expires: i64, disposition: &str, content_type: &str) -> String {
        format!("GET\n{key}\n{expires}\n{disposition}\n{content_type}")
    }
}
