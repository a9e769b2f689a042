//! Tenant and creator resolution from request headers.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{AppState, error::ApiError};

/// Header naming the tenant a request acts for.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Header naming the user behind a request.
pub const CREATOR_HEADER: &str = "x-creator-id";

const ANONYMOUS: &str = "anonymous";

/// Tenant of the request: the `X-Tenant-Id` header, else the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant(pub String);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.headers.get(TENANT_HEADER) {
            Some(value) => {
                let tenant = value
                    .to_str()
                    .map_err(|_| ApiError::validation("X-Tenant-Id is not valid ASCII"))?
                    .trim();
                if tenant.is_empty() {
                    return Err(ApiError::validation("X-Tenant-Id is empty"));
                }
                Ok(Self(tenant.to_string()))
            }
            None => state
                .default_tenant
                .clone()
                .map(Self)
                .ok_or_else(|| ApiError::validation("X-Tenant-Id header is required")),
        }
    }
}

/// Uploader of the request: the `X-Creator-Id` header, else `anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator(pub String);

impl<S> FromRequestParts<S> for Creator
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let creator = parts
            .headers
            .get(CREATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS);
        Ok(Self(creator.to_string()))
    }
}
