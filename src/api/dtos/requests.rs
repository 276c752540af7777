use serde::Deserialize;

use crate::domain::models::booking::BookingStatus;
use crate::domain::models::contact::ContactMessage;
use crate::domain::models::invoice::{CustomerDetails, DeliveryOptions, InvoiceRequest, LineItem};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub service_type: String,
    pub vehicle_size: Option<String>,
    #[serde(default)]
    pub add_ons: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub vehicle: VehicleInput,
    pub service_type: String,
    #[serde(default)]
    pub add_ons: Vec<String>,
    /// `YYYY-MM-DD`
    pub preferred_date: String,
    /// `HH:MM`
    pub preferred_time: String,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub service: Option<String>,
}

impl From<ContactRequest> for ContactMessage {
    fn from(r: ContactRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            phone: r.phone,
            subject: r.subject,
            message: r.message,
            service: r.service,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub description: String,
    pub amount: f64,
    pub quantity: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
    pub deposit_amount: Option<f64>,
    pub send_via_email: Option<bool>,
    pub send_via_sms: Option<bool>,
    pub days_until_due: Option<u32>,
    pub booking_id: Option<String>,
    pub create_as_draft: Option<bool>,
}

impl From<CreateInvoiceRequest> for InvoiceRequest {
    fn from(r: CreateInvoiceRequest) -> Self {
        Self {
            customer: CustomerDetails { name: r.customer_name, email: r.customer_email, phone: r.customer_phone },
            line_items: r
                .line_items
                .into_iter()
                .map(|l| LineItem { description: l.description, amount: l.amount, quantity: l.quantity })
                .collect(),
            deposit_amount: r.deposit_amount,
            send_via_email: r.send_via_email,
            send_via_sms: r.send_via_sms,
            days_until_due: r.days_until_due,
            booking_id: r.booking_id,
            create_as_draft: r.create_as_draft,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceRequest {
    pub send_via_email: Option<bool>,
    pub send_via_sms: Option<bool>,
    pub customer_phone: Option<String>,
}

impl From<SendInvoiceRequest> for DeliveryOptions {
    fn from(r: SendInvoiceRequest) -> Self {
        Self {
            send_via_email: r.send_via_email.unwrap_or(true),
            send_via_sms: r.send_via_sms.unwrap_or(false),
            customer_phone: r.customer_phone.filter(|p| !p.trim().is_empty()),
        }
    }
}

#[derive(Deserialize)]
pub struct AssetListQuery {
    pub folder: Option<String>,
}
