//! Storage configuration types.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tether_shared::config::StorageSettings;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Google Cloud Storage, or an emulator when `endpoint` is set.
    Gcs {
        /// Bucket name.
        bucket: String,
        /// Custom endpoint (emulator).
        endpoint: Option<String>,
        /// Base64 encoded service account JSON; ambient credentials when absent.
        credential: Option<String>,
    },
    /// S3-compatible storage: Cloudflare R2, MinIO, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL; AWS default when absent.
        endpoint: Option<String>,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: Option<String>,
        /// AWS secret access key.
        secret_access_key: Option<String>,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: Option<String>,
        /// Azure container name.
        container: String,
        /// Custom endpoint (Azurite).
        endpoint: Option<String>,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory (tests and demos)
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short provider name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gcs { .. } => "gcs",
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local_fs",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Validity window of issued download URLs.
    pub url_expiration_minutes: u32,
    /// Issue `http://` download URLs.
    pub insecure: bool,
    /// HMAC secret; when set, download URLs are signed locally.
    pub signing_secret: Option<String>,
    /// Host embedded in locally signed URLs.
    pub public_host: String,
}

impl StorageConfig {
    /// Default URL validity: 15 minutes.
    pub const DEFAULT_URL_EXPIRATION_MINUTES: u32 = 15;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            url_expiration_minutes: Self::DEFAULT_URL_EXPIRATION_MINUTES,
            insecure: false,
            signing_secret: None,
            public_host: "localhost:8080".to_string(),
        }
    }

    /// Sign download URLs locally with `secret`.
    #[must_use]
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Build from loaded application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider is unknown, a field the
    /// provider needs is missing, or the credentials cannot be decoded.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        if settings.url_expiration_minutes == 0 {
            return Err(StorageError::configuration(
                "url_expiration_minutes must be at least 1",
            ));
        }

        let provider = match settings.provider.as_str() {
            "gcs" => StorageProvider::Gcs {
                bucket: required(settings.bucket.as_ref(), "bucket")?,
                endpoint: settings.endpoint.clone(),
                credential: settings
                    .credentials
                    .as_ref()
                    .map(|c| service_account_credential(&c.access_id, &c.private_key_base64))
                    .transpose()?,
            },
            "s3" => StorageProvider::S3 {
                endpoint: settings.endpoint.clone(),
                bucket: required(settings.bucket.as_ref(), "bucket")?,
                access_key_id: settings.access_key_id.clone(),
                secret_access_key: settings.secret_access_key.clone(),
                region: settings
                    .region
                    .clone()
                    .unwrap_or_else(|| "auto".to_string()),
            },
            "azure_blob" => StorageProvider::AzureBlob {
                account: required(settings.access_key_id.as_ref(), "access_key_id")?,
                access_key: settings.secret_access_key.clone(),
                container: required(settings.bucket.as_ref(), "bucket")?,
                endpoint: settings.endpoint.clone(),
            },
            "local_fs" => StorageProvider::local_fs(required(settings.root.as_ref(), "root")?),
            "memory" => StorageProvider::Memory,
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        Ok(Self {
            provider,
            url_expiration_minutes: settings.url_expiration_minutes,
            insecure: settings.insecure,
            signing_secret: settings.signing_secret.clone().filter(|s| !s.is_empty()),
            public_host: settings.public_host.clone(),
        })
    }
}

fn required(value: Option<&String>, field: &str) -> Result<String, StorageError> {
    value
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| StorageError::configuration(format!("storage.{field} is required")))
}

/// Assemble a base64 encoded service account document from an access id and
/// a base64 encoded PEM key.
fn service_account_credential(
    access_id: &str,
    private_key_base64: &str,
) -> Result<String, StorageError> {
    let pem = STANDARD
        .decode(private_key_base64.trim())
        .map_err(|e| StorageError::configuration(format!("private key is not base64: {e}")))?;
    let pem = String::from_utf8(pem)
        .map_err(|_| StorageError::configuration("private key is not valid UTF-8"))?;

    let document = serde_json::json!({
        "type": "service_account",
        "client_email": access_id,
        "private_key": pem,
    });

    Ok(STANDARD.encode(document.to_string()))
}
