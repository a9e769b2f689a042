//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// File metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Tenant resolution.
    #[serde(default)]
    pub tenancy: TenancyConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for a single request; the use case is cancelled past it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Largest accepted multipart body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

/// Blob storage settings as read from config files and the environment.
///
/// Which fields are required depends on `provider`; the core crate
/// validates the combination when it builds its storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// One of `gcs`, `s3`, `azure_blob`, `local_fs`, `memory`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Bucket (or Azure container) name.
    pub bucket: Option<String>,
    /// Custom endpoint, e.g. a storage emulator.
    pub endpoint: Option<String>,
    /// Region (S3).
    pub region: Option<String>,
    /// Root directory (local filesystem provider).
    pub root: Option<String>,
    /// Access key id (S3) or account name (Azure).
    pub access_key_id: Option<String>,
    /// Secret access key (S3) or account key (Azure).
    pub secret_access_key: Option<String>,
    /// Validity window of issued download URLs.
    #[serde(default = "default_url_expiration")]
    pub url_expiration_minutes: u32,
    /// Issue `http://` instead of `https://` download URLs.
    #[serde(default)]
    pub insecure: bool,
    /// Explicit signing credentials; ambient credentials are used when absent.
    pub credentials: Option<SigningCredentials>,
    /// HMAC secret for backends without native presigning.
    pub signing_secret: Option<String>,
    /// Host (and optional port) the service is reachable at, used in locally
    /// signed URLs.
    #[serde(default = "default_public_host")]
    pub public_host: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            bucket: None,
            endpoint: None,
            region: None,
            root: None,
            access_key_id: None,
            secret_access_key: None,
            url_expiration_minutes: default_url_expiration(),
            insecure: false,
            credentials: None,
            signing_secret: None,
            public_host: default_public_host(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_url_expiration() -> u32 {
    15
}

fn default_public_host() -> String {
    "localhost:8080".to_string()
}

/// Service account credentials used to sign download URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct SigningCredentials {
    /// Service account e-mail / access id.
    pub access_id: String,
    /// PEM private key, base64 encoded.
    pub private_key_base64: String,
}

/// Metadata store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataBackend {
    /// Process-local store; contents are lost on restart.
    #[default]
    Memory,
    /// SQL database through SeaORM.
    Database,
}

/// Metadata store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: MetadataBackend,
    /// Required when `backend = "database"`.
    pub database: Option<DatabaseConfig>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Tenant resolution configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenancyConfig {
    /// Tenant used when a request carries no `X-Tenant-Id` header.
    pub default_tenant: Option<String>,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "tether=info,tower_http=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TETHER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
