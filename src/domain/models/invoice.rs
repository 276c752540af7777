use serde::{Deserialize, Serialize};

use crate::domain::models::money::to_major_units;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
    Uncollectible,
    Void,
}

impl InvoiceStatus {
    pub fn is_finalized(&self) -> bool {
        !matches!(self, InvoiceStatus::Draft)
    }
}

/// Provider invoice ids look like `in_<alphanumeric>`.
pub fn validate_invoice_id(invoice_id: &str) -> Result<(), AppError> {
    let valid = invoice_id
        .strip_prefix("in_")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()));
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid invoice id: {}", invoice_id)))
    }
}

#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LineItem {
    pub description: String,
    /// Major units.
    pub amount: f64,
    pub quantity: Option<u32>,
}

/// An invoice request as submitted by the admin UI.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub customer: CustomerDetails,
    pub line_items: Vec<LineItem>,
    pub deposit_amount: Option<f64>,
    pub send_via_email: Option<bool>,
    pub send_via_sms: Option<bool>,
    pub days_until_due: Option<u32>,
    pub booking_id: Option<String>,
    pub create_as_draft: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryOptions {
    pub send_via_email: bool,
    pub send_via_sms: bool,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub email_sent: bool,
    pub sms_sent: bool,
}

// Provider-facing shapes. Amounts are minor units.

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub customer_id: String,
    pub description: String,
    pub unit_amount: i64,
    pub quantity: u32,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: String,
    pub currency: String,
    pub days_until_due: u32,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderInvoice {
    pub id: String,
    pub number: Option<String>,
    pub status: InvoiceStatus,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub total: i64,
    pub amount_due: i64,
    pub amount_paid: i64,
    pub amount_remaining: i64,
    pub currency: String,
    pub hosted_invoice_url: Option<String>,
    pub invoice_pdf: Option<String>,
    /// Unix seconds.
    pub due_date: Option<i64>,
    pub booking_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceOutcome {
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub status: InvoiceStatus,
    pub hosted_invoice_url: Option<String>,
    pub total: f64,
    pub customer_id: String,
    pub email_sent: bool,
    pub sms_sent: bool,
}

impl InvoiceOutcome {
    pub fn new(invoice: &ProviderInvoice, total_minor: i64, delivery: DeliveryReport) -> Self {
        Self {
            invoice_id: invoice.id.clone(),
            invoice_number: invoice.number.clone(),
            status: invoice.status,
            hosted_invoice_url: invoice.hosted_invoice_url.clone(),
            total: to_major_units(total_minor),
            customer_id: invoice.customer_id.clone(),
            email_sent: delivery.email_sent,
            sms_sent: delivery.sms_sent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub status: InvoiceStatus,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub total: f64,
    pub amount_due: f64,
    pub amount_paid: f64,
    pub amount_remaining: f64,
    pub currency: String,
    pub hosted_invoice_url: Option<String>,
    pub invoice_pdf: Option<String>,
    pub due_date: Option<i64>,
    pub booking_id: Option<String>,
}

impl From<ProviderInvoice> for InvoiceView {
    fn from(invoice: ProviderInvoice) -> Self {
        Self {
            invoice_id: invoice.id,
            invoice_number: invoice.number,
            status: invoice.status,
            customer_id: invoice.customer_id,
            customer_name: invoice.customer_name,
            customer_email: invoice.customer_email,
            total: to_major_units(invoice.total),
            amount_due: to_major_units(invoice.amount_due),
            amount_paid: to_major_units(invoice.amount_paid),
            amount_remaining: to_major_units(invoice.amount_remaining),
            currency: invoice.currency,
            hosted_invoice_url: invoice.hosted_invoice_url,
            invoice_pdf: invoice.invoice_pdf,
            due_date: invoice.due_date,
            booking_id: invoice.booking_id,
        }
    }
}
