use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::admin::AdminAuth;
use crate::api::dtos::requests::{CreateBookingRequest, UpdateBookingStatusRequest};
use crate::domain::models::booking::{Booking, NewBookingParams, Vehicle};
use crate::domain::services::pricing;
use crate::error::AppError;
use std::sync::Arc;
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::info;

const MAX_NOTES_LEN: usize = 2000;

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let customer_name = required(&payload.customer_name, "Customer name")?;
    let customer_email = required(&payload.customer_email, "Customer email")?;
    if !customer_email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".into()));
    }
    let customer_phone = required(&payload.customer_phone, "Customer phone")?;
    let make = required(&payload.vehicle.make, "Vehicle make")?;
    let model = required(&payload.vehicle.model, "Vehicle model")?;

    let preferred_date = NaiveDate::parse_from_str(payload.preferred_date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format (YYYY-MM-DD)".into()))?;
    if preferred_date < Utc::now().date_naive() {
        return Err(AppError::Validation("Cannot book in the past".into()));
    }
    let preferred_time = NaiveTime::parse_from_str(payload.preferred_time.trim(), "%H:%M")
        .map_err(|_| AppError::Validation("Invalid time format (HH:MM)".into()))?;

    let notes = optional(payload.notes);
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(AppError::Validation(format!("Notes must be at most {} characters", MAX_NOTES_LEN)));
    }

    let quote = pricing::quote(&payload.service_type, payload.vehicle.size.as_deref(), &payload.add_ons)?;

    let booking = Booking::new(NewBookingParams {
        customer_name,
        customer_email,
        customer_phone,
        vehicle: Vehicle {
            make,
            model,
            year: payload.vehicle.year,
            color: optional(payload.vehicle.color),
            size: quote.vehicle_size.clone(),
        },
        service_type: quote.service_type.clone(),
        add_ons: quote.add_ons.iter().map(|a| a.id.clone()).collect(),
        preferred_date,
        preferred_time: preferred_time.format("%H:%M").to_string(),
        address: optional(payload.address),
        notes,
        total_cents: quote.total,
    });

    let created = state.booking_repo.create(&booking).await?;
    info!("Booking {} created for {} on {}", created.id, created.service_type, created.preferred_date);

    state.notifications.booking_received(&created).await;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list().await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    if !booking.status.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!("Cannot move booking from {} to {}", booking.status, payload.status)));
    }

    let updated = state.booking_repo.update_status(&booking_id, payload.status).await?;
    info!("Booking {} moved from {} to {}", booking_id, booking.status, updated.status);
    Ok(Json(updated))
}
