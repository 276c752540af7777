use axum::{response::IntoResponse, Json};
use crate::api::dtos::requests::QuoteRequest;
use crate::domain::services::pricing;
use crate::error::AppError;

pub async fn quote(Json(payload): Json<QuoteRequest>) -> Result<impl IntoResponse, AppError> {
    let quote = pricing::quote(&payload.service_type, payload.vehicle_size.as_deref(), &payload.add_ons)?;
    Ok(Json(quote))
}

pub async fn catalogue() -> impl IntoResponse {
    Json(pricing::catalogue())
}
