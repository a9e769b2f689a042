//! Blob storage implementation using Apache OpenDAL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::keys::{
    ATTACHMENT_DISPOSITION, content_disposition, content_type_for, object_key, tenant_prefix,
};
use super::port::BlobStorage;
use super::signer::LocalUrlSigner;
use crate::clock::Clock;

/// How download URLs are produced.
enum UrlSigning {
    /// Backend presigns (GCS, S3, Azure).
    Native,
    /// Service-signed links to its own download route.
    Local(Arc<LocalUrlSigner>),
}

/// [`BlobStorage`] over any OpenDAL operator.
pub struct OpenDalBlobStorage {
    operator: Operator,
    provider: &'static str,
    signing: UrlSigning,
}

impl OpenDalBlobStorage {
    /// Create a storage service from configuration.
    ///
    /// Download URLs are signed locally when a signing secret is configured,
    /// otherwise the backend must support presigning.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be initialized or no URL
    /// signing method is available.
    pub fn from_config(config: &StorageConfig, clock: Arc<dyn Clock>) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        let signer = config
            .signing_secret
            .as_ref()
            .map(|secret| LocalUrlSigner::new(secret, config.public_host.clone(), clock))
            .transpose()?;

        Self::with_operator(operator, config.provider.name(), signer.map(Arc::new))
    }

    /// Wrap an existing operator.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `signer` is `None` and the operator
    /// cannot presign reads.
    pub fn with_operator(
        operator: Operator,
        provider: &'static str,
        signer: Option<Arc<LocalUrlSigner>>,
    ) -> Result<Self, StorageError> {
        let signing = match signer {
            Some(signer) => UrlSigning::Local(signer),
            None if operator.info().full_capability().presign_read => UrlSigning::Native,
            None => {
                return Err(StorageError::configuration(format!(
                    "provider '{provider}' cannot presign download urls; configure storage.signing_secret"
                )));
            }
        };

        Ok(Self {
            operator,
            provider,
            signing,
        })
    }

    /// Signer used for download URLs, when they are signed locally.
    #[must_use]
    pub fn local_signer(&self) -> Option<Arc<LocalUrlSigner>> {
        match &self.signing {
            UrlSigning::Local(signer) => Some(Arc::clone(signer)),
            UrlSigning::Native => None,
        }
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Gcs {
                bucket,
                endpoint,
                credential,
            } => {
                let mut builder = services::Gcs::default().bucket(bucket);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                match credential {
                    Some(credential) => builder = builder.credential(credential),
                    // emulator without credentials
                    None if endpoint.is_some() => {
                        builder = builder
                            .allow_anonymous()
                            .disable_vm_metadata()
                            .disable_config_load();
                    }
                    None => {}
                }
                build(builder)
            }
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let mut builder = services::S3::default().bucket(bucket).region(region);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(key) = access_key_id {
                    builder = builder.access_key_id(key);
                }
                if let Some(secret) = secret_access_key {
                    builder = builder.secret_access_key(secret);
                }
                build(builder)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
                endpoint,
            } => {
                let mut builder = services::Azblob::default()
                    .account_name(account)
                    .container(container);
                if let Some(key) = access_key {
                    builder = builder.account_key(key);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                build(builder)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );
                build(builder)
            }
            StorageProvider::Memory => build(services::Memory::default()),
        }
    }
}

fn build<B: opendal::Builder>(builder: B) -> Result<Operator, StorageError> {
    Ok(Operator::new(builder)
        .map_err(|e| StorageError::configuration(e.to_string()))?
        .finish())
}

#[async_trait]
impl BlobStorage for OpenDalBlobStorage {
    async fn upload_file(
        &self,
        tenant: &str,
        file_name: &str,
        content: Bytes,
    ) -> Result<(), StorageError> {
        let key = object_key(tenant, file_name)?;
        let capability = self.operator.info().full_capability();

        // Backends without conditional writes get a check-then-write; a
        // concurrent upload between the two calls can still overwrite.
        if !capability.write_with_if_not_exists
            && self
                .operator
                .exists(&key)
                .await
                .map_err(|e| StorageError::from_opendal(&e, &key))?
        {
            return Err(StorageError::already_exists(key));
        }

        let size = content.len();
        let mut write = self.operator.write_with(&key, content);
        if capability.write_with_if_not_exists {
            write = write.if_not_exists(true);
        }
        if capability.write_with_content_type {
            write = write.content_type(&content_type_for(file_name));
        }
        if capability.write_with_content_disposition {
            write = write.content_disposition(&content_disposition(file_name));
        }
        write
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))?;

        debug!(provider = self.provider, key = %key, size, "Blob written");
        Ok(())
    }

    async fn get_expiring_url(
        &self,
        tenant: &str,
        file_name: &str,
        expiry_minutes: u32,
        insecure: bool,
    ) -> Result<String, StorageError> {
        match &self.signing {
            UrlSigning::Local(signer) => signer.sign(tenant, file_name, expiry_minutes, insecure),
            UrlSigning::Native => {
                let key = object_key(tenant, file_name)?;
                let ttl = Duration::from_secs(u64::from(expiry_minutes) * 60);
                let presigned = self
                    .operator
                    .presign_read_with(&key, ttl)
                    .override_content_disposition(ATTACHMENT_DISPOSITION)
                    .override_content_type(&content_type_for(file_name))
                    .await
                    .map_err(|e| StorageError::from_opendal(&e, &key))?;

                let url = presigned.uri().to_string();
                Ok(if insecure {
                    url.replacen("https://", "http://", 1)
                } else {
                    url
                })
            }
        }
    }

    async fn delete_file(&self, tenant: &str, file_name: &str) -> Result<(), StorageError> {
        let key = object_key(tenant, file_name)?;
        self.operator
            .delete(&key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))?;
        debug!(provider = self.provider, key = %key, "Blob deleted");
        Ok(())
    }

    async fn exists(&self, tenant: &str, file_name: &str) -> Result<bool, StorageError> {
        let key = object_key(tenant, file_name)?;
        self.operator
            .exists(&key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))
    }

    async fn read_file(&self, tenant: &str, file_name: &str) -> Result<Bytes, StorageError> {
        let key = object_key(tenant, file_name)?;
        let buffer = self
            .operator
            .read(&key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))?;
        Ok(buffer.to_bytes())
    }

    async fn list_files(&self, tenant: &str) -> Result<Vec<String>, StorageError> {
        let prefix = tenant_prefix(tenant)?;
        let entries = match self.operator.list_with(&prefix).recursive(true).await {
            Ok(entries) => entries,
            // an untouched tenant has no directory on filesystem backends
            Err(e) if e.kind() == opendal::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_opendal(&e, &prefix)),
        };

        let mut names: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().mode().is_file())
            .filter_map(|entry| entry.path().strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }
}
