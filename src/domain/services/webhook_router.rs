use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::domain::models::booking::BookingStatus;
use crate::domain::models::webhook::{PaymentEventType, WebhookEvent};
use crate::domain::ports::{BookingRepository, WebhookEventRepository};
use crate::domain::services::notification_service::NotificationService;
use crate::error::AppError;

/// What happened to a verified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Processed,
    /// Handler failed; the delivery is still acknowledged.
    Failed,
    Duplicate,
    Ignored,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Processed => "processed",
            Disposition::Failed => "failed",
            Disposition::Duplicate => "duplicate",
            Disposition::Ignored => "ignored",
        }
    }
}

/// Routes verified payment events to their handlers.
pub struct WebhookRouter {
    events: Arc<dyn WebhookEventRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifications: Arc<NotificationService>,
}

impl WebhookRouter {
    pub fn new(
        events: Arc<dyn WebhookEventRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self { events, bookings, notifications }
    }

    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn dispatch(&self, event: &WebhookEvent) -> Disposition {
        match self.events.record(&event.id, &event.event_type).await {
            Ok(true) => {}
            Ok(false) => {
                if !self.previously_failed(&event.id).await {
                    info!("Duplicate delivery, already seen");
                    return Disposition::Duplicate;
                }
                info!("Redelivery of an event whose handler failed; handling again");
            }
            // Handled anyway; the handlers tolerate redelivery.
            Err(e) => warn!("Failed to record webhook event: {}", e),
        }

        let kind = event.kind();
        if kind == PaymentEventType::Unknown {
            info!("Unhandled event type {}", event.event_type);
            self.mark(event, Disposition::Ignored, None).await;
            return Disposition::Ignored;
        }

        match self.handle(kind, event).await {
            Ok(()) => {
                self.mark(event, Disposition::Processed, None).await;
                Disposition::Processed
            }
            Err(e) => {
                error!("Webhook handler failed: {}", e);
                self.mark(event, Disposition::Failed, Some(e.to_string())).await;
                Disposition::Failed
            }
        }
    }

    async fn handle(&self, kind: PaymentEventType, event: &WebhookEvent) -> Result<(), AppError> {
        match kind {
            PaymentEventType::PaymentIntentSucceeded | PaymentEventType::CheckoutSessionCompleted => {
                self.confirm_booking(event, None).await
            }
            PaymentEventType::InvoicePaid => self.confirm_booking(event, event.object_id()).await,
            PaymentEventType::PaymentIntentFailed | PaymentEventType::InvoicePaymentFailed => {
                self.report_failure(event).await;
                Ok(())
            }
            PaymentEventType::Unknown => Ok(()),
        }
    }

    async fn confirm_booking(&self, event: &WebhookEvent, invoice_id: Option<&str>) -> Result<(), AppError> {
        let Some(booking_id) = event.booking_reference() else {
            info!("Payment {:?} carries no booking reference", event.object_id());
            return Ok(());
        };

        let booking = self
            .bookings
            .find_by_id(&booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

        if let Some(invoice_id) = invoice_id {
            self.bookings.attach_invoice(&booking.id, invoice_id).await?;
        }

        if booking.status == BookingStatus::Pending {
            self.bookings.update_status(&booking.id, BookingStatus::Confirmed).await?;
            info!("Booking {} confirmed by payment", booking.id);
        } else {
            info!("Booking {} is {}, leaving status unchanged", booking.id, booking.status);
        }
        Ok(())
    }

    async fn report_failure(&self, event: &WebhookEvent) {
        let booking_id = event.booking_reference();
        let reason = failure_reason(&event.data.object);
        warn!(
            "Payment failed for {:?} (booking {:?}): {}",
            event.object_id(),
            booking_id,
            reason.as_deref().unwrap_or("no reason given")
        );
        self.notifications
            .payment_failed(&event.event_type, event.object_id(), booking_id.as_deref(), reason.as_deref())
            .await;
    }

    async fn previously_failed(&self, event_id: &str) -> bool {
        match self.events.find(event_id).await {
            Ok(Some(record)) => record.status == Disposition::Failed.as_str(),
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to look up webhook event {}: {}", event_id, e);
                false
            }
        }
    }

    async fn mark(&self, event: &WebhookEvent, disposition: Disposition, error_message: Option<String>) {
        if let Err(e) = self.events.mark(&event.id, disposition.as_str(), error_message).await {
            warn!("Failed to update webhook event {}: {}", event.id, e);
        }
    }
}

fn failure_reason(object: &Value) -> Option<String> {
    object
        .get("last_payment_error")
        .and_then(|e| e.get("message"))
        .or_else(|| object.get("last_finalization_error").and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}
