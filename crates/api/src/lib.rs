//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - The `/api/files` REST routes
//! - Tenant and creator extractors
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tether_core::files::FileService;
use tether_core::storage::LocalUrlSigner;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// File lifecycle use case.
    pub files: Arc<FileService>,
    /// Verifies download links when the storage backend cannot presign.
    pub signer: Option<Arc<LocalUrlSigner>>,
    /// Tenant used when a request carries no `X-Tenant-Id` header.
    pub default_tenant: Option<String>,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
    /// Deadline for a single use-case call.
    pub request_timeout: Duration,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

/// Cancellation scope of one request.
///
/// The token fires on server shutdown or when the request deadline passes.
/// Dropping the scope cancels it, which also stops the deadline timer.
pub struct RequestScope {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestScope {
    /// Token to hand to use-case calls.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl AppState {
    /// Open a cancellation scope for a request.
    #[must_use]
    pub fn request_scope(&self) -> RequestScope {
        let token = self.shutdown.child_token();
        let deadline = token.clone();
        let timeout = self.request_timeout;
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => deadline.cancel(),
                () = deadline.cancelled() => {}
            }
        });

        RequestScope {
            _guard: token.clone().drop_guard(),
            token,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/files", routes::files::routes())
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
