use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Guards back-office routes with a static bearer token.
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .admin_api_token
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("Admin access is not configured".into()))?;

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        if Sha256::digest(presented.trim().as_bytes()) != Sha256::digest(expected.as_bytes()) {
            warn!("Rejected admin token on {}", parts.uri.path());
            return Err(AppError::Unauthorized);
        }

        Ok(AdminAuth)
    }
}
