use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;
use crate::api::dtos::responses::WebhookAck;
use crate::domain::models::webhook::WebhookEvent;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::{info, warn};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Verifies the raw body before anything is parsed. A verified, well-formed delivery
/// is always acknowledged, whatever the handlers make of it.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingSignature)?;

    let verifier = state.webhook_verifier()?;
    verifier
        .verify(&body, signature, Utc::now().timestamp())
        .map_err(|e| AppError::InvalidSignature(e.to_string()))?;

    let event: WebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        warn!("Verified webhook body is not an event envelope: {}", e);
        AppError::Validation("Malformed event payload".into())
    })?;

    let disposition = state.webhook_router.dispatch(&event).await;
    info!("Webhook {} ({}) {}", event.id, event.event_type, disposition.as_str());

    Ok(Json(WebhookAck { received: true }))
}
