use std::sync::Arc;

use serde_json::{json, Value};
use tera::{Context, Tera};
use tracing::{error, info, warn};

use crate::domain::models::booking::Booking;
use crate::domain::models::contact::ContactMessage;
use crate::domain::models::money::to_major_units;
use crate::domain::ports::{EmailService, MessagingGateway};
use crate::error::AppError;

pub const BOOKING_NOTIFICATION: &str = "booking_notification.html";
pub const BOOKING_CONFIRMATION: &str = "booking_confirmation.html";
pub const CONTACT_NOTIFICATION: &str = "contact_notification.html";
pub const PAYMENT_FAILED: &str = "payment_failed.html";

#[derive(Debug, Clone)]
pub struct BusinessContact {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Renders templated mail and routes it to the business or the customer.
pub struct NotificationService {
    email: Option<Arc<dyn EmailService>>,
    messaging: Option<Arc<dyn MessagingGateway>>,
    templates: Arc<Tera>,
    business: BusinessContact,
}

impl NotificationService {
    pub fn new(
        email: Option<Arc<dyn EmailService>>,
        messaging: Option<Arc<dyn MessagingGateway>>,
        templates: Arc<Tera>,
        business: BusinessContact,
    ) -> Self {
        Self { email, messaging, templates, business }
    }

    pub fn render(&self, template_name: &str, data: &Value) -> Result<String, AppError> {
        let context = Context::from_value(data.clone())
            .map_err(|e| AppError::InternalWithMsg(format!("Template context error: {:?}", e)))?;
        self.templates
            .render(template_name, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))
    }

    /// Notifies the business and confirms to the customer. Never fails the caller.
    pub async fn booking_received(&self, booking: &Booking) {
        let Some(email) = &self.email else {
            warn!("Email is not configured; skipping notifications for booking {}", booking.id);
            return;
        };

        let data = self.booking_context(booking);

        if let Some(business_email) = &self.business.email {
            let subject = format!("New booking: {} for {}", booking.service_type, booking.customer_name);
            match self.render(BOOKING_NOTIFICATION, &data) {
                Ok(body) => {
                    if let Err(e) = email.send(business_email, &subject, &body, Some(&booking.customer_email)).await {
                        error!("Failed to send booking notification for {}: {}", booking.id, e);
                    }
                }
                Err(e) => error!("Failed to render booking notification: {}", e),
            }
        }

        let subject = format!("Your {} booking request", self.business.name);
        match self.render(BOOKING_CONFIRMATION, &data) {
            Ok(body) => match email.send(&booking.customer_email, &subject, &body, self.business.email.as_deref()).await {
                Ok(()) => info!("Booking confirmation sent to {}", booking.customer_email),
                Err(e) => error!("Failed to send booking confirmation for {}: {}", booking.id, e),
            },
            Err(e) => error!("Failed to render booking confirmation: {}", e),
        }
    }

    /// Forwards a contact form message to the business inbox. Email is required;
    /// the SMS alert is best-effort.
    pub async fn contact_received(&self, message: &ContactMessage) -> Result<(), AppError> {
        let email = self
            .email
            .as_ref()
            .ok_or_else(|| AppError::Unavailable("Email delivery is not configured".into()))?;
        let business_email = self
            .business
            .email
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("Business email is not configured".into()))?;

        let data = json!({
            "business_name": self.business.name,
            "name": message.name.trim(),
            "email": message.email.trim(),
            "phone": message.phone,
            "subject": message.subject,
            "service": message.service,
            "message": message.message.trim(),
        });
        let body = self.render(CONTACT_NOTIFICATION, &data)?;

        email.send(business_email, &message.subject_line(), &body, Some(message.email.trim())).await?;
        info!("Contact message from {} forwarded", message.email);

        if let (Some(messaging), Some(phone)) = (&self.messaging, &self.business.phone) {
            let alert = format!("New inquiry from {} ({}). Check your inbox.", message.name.trim(), message.email.trim());
            if let Err(e) = messaging.send_sms(phone, &alert).await {
                warn!("Contact SMS alert failed: {}", e);
            }
        }

        Ok(())
    }

    pub async fn payment_failed(&self, event_type: &str, object_id: Option<&str>, booking_id: Option<&str>, reason: Option<&str>) {
        let (Some(email), Some(business_email)) = (&self.email, &self.business.email) else {
            warn!("Payment failure {} could not be emailed: email or business address not configured", event_type);
            return;
        };

        let data = json!({
            "business_name": self.business.name,
            "event_type": event_type,
            "object_id": object_id,
            "booking_id": booking_id,
            "reason": reason,
        });

        match self.render(PAYMENT_FAILED, &data) {
            Ok(body) => {
                if let Err(e) = email.send(business_email, "Payment failed", &body, None).await {
                    error!("Failed to send payment failure notice: {}", e);
                }
            }
            Err(e) => error!("Failed to render payment failure notice: {}", e),
        }
    }

    fn booking_context(&self, booking: &Booking) -> Value {
        json!({
            "business_name": self.business.name,
            "business_phone": self.business.phone,
            "booking_id": booking.id,
            "customer_name": booking.customer_name,
            "customer_email": booking.customer_email,
            "customer_phone": booking.customer_phone,
            "vehicle": format!("{} {}", booking.vehicle.make, booking.vehicle.model),
            "vehicle_year": booking.vehicle.year,
            "vehicle_color": booking.vehicle.color,
            "vehicle_size": booking.vehicle.size,
            "service_type": booking.service_type,
            "add_ons": booking.add_ons.0,
            "preferred_date": booking.preferred_date.format("%A, %B %-d, %Y").to_string(),
            "preferred_time": booking.preferred_time,
            "address": booking.address,
            "notes": booking.notes,
            "total": format!("{:.2}", to_major_units(booking.total_cents)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::booking::{NewBookingParams, Vehicle};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockMail {
        sent: Mutex<Vec<(String, String, Option<String>)>>,
    }

    #[async_trait]
    impl EmailService for MockMail {
        async fn send(&self, recipient: &str, subject: &str, _html_body: &str, reply_to: Option<&str>) -> Result<(), AppError> {
            self.sent.lock().unwrap().push((recipient.into(), subject.into(), reply_to.map(str::to_string)));
            Ok(())
        }
    }

    fn templates() -> Arc<Tera> {
        let mut tera = Tera::default();
        tera.add_raw_template(BOOKING_NOTIFICATION, "New booking {{ booking_id }}").unwrap();
        tera.add_raw_template(BOOKING_CONFIRMATION, "Thanks {{ customer_name }}, total ${{ total }}").unwrap();
        tera.add_raw_template(CONTACT_NOTIFICATION, "{{ name }} wrote: {{ message }}").unwrap();
        tera.add_raw_template(PAYMENT_FAILED, "{{ event_type }}").unwrap();
        Arc::new(tera)
    }

    fn business(email: Option<&str>) -> BusinessContact {
        BusinessContact { name: "Shine Mobile".into(), email: email.map(str::to_string), phone: None }
    }

    fn booking() -> Booking {
        Booking::new(NewBookingParams {
            customer_name: "Sam".into(),
            customer_email: "sam@example.com".into(),
            customer_phone: "+15550002222".into(),
            vehicle: Vehicle { make: "Honda".into(), model: "Civic".into(), year: Some(2019), color: None, size: "sedan".into() },
            service_type: "full-detail".into(),
            add_ons: vec![],
            preferred_date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            preferred_time: "10:00".into(),
            address: None,
            notes: None,
            total_cents: 19_900,
        })
    }

    #[test]
    fn test_render_booking_confirmation() {
        let service = NotificationService::new(None, None, templates(), business(None));
        let body = service.render(BOOKING_CONFIRMATION, &service.booking_context(&booking())).unwrap();
        assert_eq!(body, "Thanks Sam, total $199.00");
    }

    #[tokio::test]
    async fn test_booking_received_emails_business_and_customer() {
        let mail = Arc::new(MockMail::default());
        let service = NotificationService::new(Some(mail.clone()), None, templates(), business(Some("owner@shine.test")));
        service.booking_received(&booking()).await;

        let sent = mail.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "owner@shine.test");
        assert_eq!(sent[0].2.as_deref(), Some("sam@example.com"));
        assert_eq!(sent[1].0, "sam@example.com");
    }

    #[tokio::test]
    async fn test_contact_requires_email_capability() {
        let service = NotificationService::new(None, None, templates(), business(Some("owner@shine.test")));
        let message = ContactMessage {
            name: "Jo".into(),
            email: "jo@example.com".into(),
            phone: None,
            subject: None,
            message: "Hello".into(),
            service: None,
        };
        assert!(matches!(service.contact_received(&message).await, Err(AppError::Unavailable(_))));
    }
}
