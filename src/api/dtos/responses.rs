use serde::Serialize;

use crate::state::Capabilities;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub capabilities: Capabilities,
}

#[derive(Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
