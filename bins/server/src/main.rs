//! Tether API Server
//!
//! Main entry point for the file attachment service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tether_api::{AppState, create_router};
use tether_core::clock::SystemClock;
use tether_core::files::{
    FileRepository, FileService, InMemoryFileRepository, UrlPolicy, UuidIdGenerator,
};
use tether_core::storage::{BlobStorage, OpenDalBlobStorage, StorageConfig};
use tether_db::{SeaOrmFileRepository, connect_with, migration::Migrator};
use tether_shared::config::{LoggingConfig, MetadataBackend, MetadataConfig};
use tether_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let storage_config = StorageConfig::from_settings(&config.storage)
        .context("invalid storage configuration")?;
    let storage = Arc::new(
        OpenDalBlobStorage::from_config(&storage_config, Arc::new(SystemClock))
            .context("failed to initialise blob storage")?,
    );
    info!(provider = %storage.provider_name(), "Blob storage ready");

    let repo = metadata_store(&config.metadata).await?;

    let signer = storage.local_signer();
    if signer.is_some() {
        info!(host = %storage_config.public_host, "Serving locally signed downloads");
    }

    let files = FileService::new(
        storage,
        repo,
        Arc::new(UuidIdGenerator),
        Arc::new(SystemClock),
        UrlPolicy {
            expiry_minutes: storage_config.url_expiration_minutes,
            insecure: storage_config.insecure,
        },
    );

    let shutdown = CancellationToken::new();
    let state = AppState {
        files: Arc::new(files),
        signer,
        default_tenant: config.tenancy.default_tenant.clone(),
        shutdown: shutdown.clone(),
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        max_upload_bytes: config.server.max_upload_bytes,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn metadata_store(config: &MetadataConfig) -> anyhow::Result<Arc<dyn FileRepository>> {
    match config.backend {
        MetadataBackend::Memory => {
            warn!("Using in-memory metadata store; records are lost on restart");
            Ok(Arc::new(InMemoryFileRepository::new()))
        }
        MetadataBackend::Database => {
            let db_config = config
                .database
                .as_ref()
                .context("metadata.database is required for the database backend")?;
            let db = connect_with(db_config)
                .await
                .context("failed to connect to database")?;
            Migrator::up(&db, None)
                .await
                .context("failed to apply migrations")?;
            info!("Connected to database");
            Ok(Arc::new(SeaOrmFileRepository::new(db)))
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM and cancels in-flight requests.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutting down...");
    token.cancel();
}
