use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::ContactRequest, responses::ContactResponse};
use crate::domain::models::contact::ContactMessage;
use crate::error::AppError;
use std::sync::Arc;

pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    let message = ContactMessage::from(payload);
    message.validate()?;

    state.notifications.contact_received(&message).await?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Thanks for reaching out! We'll get back to you shortly.".to_string(),
    }))
}
