use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminAuth;
use crate::api::dtos::requests::{CreateInvoiceRequest, SendInvoiceRequest};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.invoices()?.create_invoice(payload.into()).await?;
    info!(
        "Invoice {} created (status {:?}, email sent: {}, sms sent: {})",
        outcome.invoice_id, outcome.status, outcome.email_sent, outcome.sms_sent
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn send_invoice(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(invoice_id): Path<String>,
    payload: Option<Json<SendInvoiceRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let options = payload.map(|Json(p)| p).unwrap_or_default();
    let outcome = state.invoices()?.send_invoice(&invoice_id, options.into()).await?;
    Ok(Json(outcome))
}

pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.invoices()?.get_invoice(&invoice_id).await?;
    Ok(Json(invoice))
}
