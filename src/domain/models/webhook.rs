use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Payment event types this service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentEventType {
    PaymentIntentSucceeded,
    PaymentIntentFailed,
    CheckoutSessionCompleted,
    InvoicePaid,
    InvoicePaymentFailed,
    Unknown,
}

impl FromStr for PaymentEventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentFailed,
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            _ => Self::Unknown,
        })
    }
}

impl PaymentEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentFailed => "payment_intent.payment_failed",
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: Value,
}

/// Signed envelope delivered by the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    pub data: WebhookEventData,
}

impl WebhookEvent {
    pub fn kind(&self) -> PaymentEventType {
        match self.event_type.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }

    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(Value::as_str)
    }

    /// Booking reference carried in the object's metadata; checkout sessions may
    /// also carry it as `client_reference_id`.
    pub fn booking_reference(&self) -> Option<String> {
        let object = &self.data.object;
        let from_metadata = object
            .get("metadata")
            .and_then(|m| m.get("bookingId").or_else(|| m.get("booking_id")))
            .and_then(Value::as_str);

        let reference = match from_metadata {
            Some(id) => Some(id),
            None if self.kind() == PaymentEventType::CheckoutSessionCompleted => {
                object.get("client_reference_id").and_then(Value::as_str)
            }
            None => None,
        };

        reference.filter(|id| !id.is_empty()).map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WebhookEventRecord {
    pub event_id: String,
    pub event_type: String,
    pub status: String,
    pub error_message: Option<String>,
    pub received_at: DateTime<Utc>,
}
