use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::InvoiceSettings;
use crate::domain::models::invoice::{
    validate_invoice_id, DeliveryOptions, DeliveryReport, InvoiceOutcome, InvoiceRequest, InvoiceView, NewCustomer,
    NewInvoice, NewInvoiceItem,
};
use crate::domain::models::money::{checked_minor_units, to_minor_units};
use crate::domain::ports::{BookingRepository, MessagingGateway, PaymentGateway};
use crate::domain::services::delivery::DeliveryDispatcher;
use crate::error::AppError;

pub const DEPOSIT_DESCRIPTION: &str = "Deposit credit";
/// Major units.
pub const MAX_LINE_AMOUNT: f64 = 1_000_000.0;
pub const MAX_QUANTITY: u32 = 10_000;

/// A request that passed validation, with every amount in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInvoice {
    pub items: Vec<PreparedItem>,
    pub deposit: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedItem {
    pub description: String,
    pub unit_amount: i64,
    pub quantity: u32,
}

pub fn prepare(request: &InvoiceRequest, default_deposit: f64) -> Result<PreparedInvoice, AppError> {
    if request.customer.name.trim().is_empty() {
        return Err(AppError::Validation("Customer name is required".into()));
    }
    let has_email = request.customer.email.as_deref().is_some_and(|e| !e.trim().is_empty());
    let has_phone = request.customer.phone.as_deref().is_some_and(|p| !p.trim().is_empty());
    if !has_email && !has_phone {
        return Err(AppError::Validation("Either customer email or phone is required".into()));
    }
    if request.line_items.is_empty() {
        return Err(AppError::Validation("At least one line item is required".into()));
    }

    let mut items = Vec::with_capacity(request.line_items.len());
    for (index, line) in request.line_items.iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(AppError::Validation(format!("Line item {} needs a description", index + 1)));
        }
        if !line.amount.is_finite() || line.amount <= 0.0 {
            return Err(AppError::Validation(format!("Line item {} must have a positive amount", index + 1)));
        }
        if line.amount > MAX_LINE_AMOUNT {
            return Err(AppError::Validation(format!("Line item {} exceeds the maximum amount of {:.2}", index + 1, MAX_LINE_AMOUNT)));
        }
        let quantity = line.quantity.unwrap_or(1);
        if quantity == 0 {
            return Err(AppError::Validation(format!("Line item {} must have a quantity of at least 1", index + 1)));
        }
        if quantity > MAX_QUANTITY {
            return Err(AppError::Validation(format!("Line item {} exceeds the maximum quantity of {}", index + 1, MAX_QUANTITY)));
        }
        items.push(PreparedItem {
            description: line.description.trim().to_string(),
            unit_amount: to_minor_units(line.amount),
            quantity,
        });
    }

    let deposit_major = request.deposit_amount.unwrap_or(default_deposit);
    if !deposit_major.is_finite() || deposit_major < 0.0 {
        return Err(AppError::Validation("Deposit amount cannot be negative".into()));
    }

    let subtotal = items
        .iter()
        .try_fold(0i64, |acc, i| i.unit_amount.checked_mul(i64::from(i.quantity)).and_then(|line| acc.checked_add(line)))
        .ok_or_else(|| AppError::Validation("Invoice total is too large".into()))?;

    let deposit = checked_minor_units(deposit_major)
        .filter(|deposit| *deposit <= subtotal)
        .ok_or_else(|| AppError::Validation("Deposit amount cannot exceed the invoice subtotal".into()))?;

    Ok(PreparedInvoice { items, deposit, total: subtotal - deposit })
}

/// Builds invoices at the payment provider and hands them to the dispatcher.
pub struct InvoiceService {
    gateway: Arc<dyn PaymentGateway>,
    dispatcher: DeliveryDispatcher,
    bookings: Arc<dyn BookingRepository>,
    settings: InvoiceSettings,
}

impl InvoiceService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        messaging: Option<Arc<dyn MessagingGateway>>,
        bookings: Arc<dyn BookingRepository>,
        settings: InvoiceSettings,
        business_name: String,
    ) -> Self {
        let dispatcher = DeliveryDispatcher::new(gateway.clone(), messaging, business_name);
        Self { gateway, dispatcher, bookings, settings }
    }

    #[instrument(skip(self, request), fields(customer = %request.customer.name, booking_id = ?request.booking_id))]
    pub async fn create_invoice(&self, request: InvoiceRequest) -> Result<InvoiceOutcome, AppError> {
        let prepared = prepare(&request, self.settings.default_deposit)?;
        let currency = self.settings.currency.clone();
        let email = request.customer.email.clone().filter(|e| !e.trim().is_empty());
        let phone = request.customer.phone.clone().filter(|p| !p.trim().is_empty());

        let customer_id = self
            .gateway
            .create_customer(&NewCustomer {
                name: request.customer.name.trim().to_string(),
                email,
                phone: phone.clone(),
                booking_id: request.booking_id.clone(),
            })
            .await?;

        for item in &prepared.items {
            self.gateway
                .create_invoice_item(&NewInvoiceItem {
                    customer_id: customer_id.clone(),
                    description: item.description.clone(),
                    unit_amount: item.unit_amount,
                    quantity: item.quantity,
                    currency: currency.clone(),
                })
                .await?;
        }

        if prepared.deposit > 0 {
            self.gateway
                .create_invoice_item(&NewInvoiceItem {
                    customer_id: customer_id.clone(),
                    description: DEPOSIT_DESCRIPTION.to_string(),
                    unit_amount: -prepared.deposit,
                    quantity: 1,
                    currency: currency.clone(),
                })
                .await?;
        }

        let invoice = self
            .gateway
            .create_invoice(&NewInvoice {
                customer_id: customer_id.clone(),
                currency,
                days_until_due: request.days_until_due.unwrap_or(self.settings.days_until_due),
                booking_id: request.booking_id.clone(),
            })
            .await?;
        info!("Invoice {} created for customer {}", invoice.id, customer_id);

        let (invoice, report) = if request.create_as_draft.unwrap_or(true) {
            (invoice, DeliveryReport::default())
        } else {
            let options = DeliveryOptions {
                send_via_email: request.send_via_email.unwrap_or(false),
                send_via_sms: request.send_via_sms.unwrap_or(false),
                customer_phone: phone,
            };
            self.dispatcher.finalize_and_send(invoice, &options).await?
        };

        if let Some(booking_id) = &request.booking_id {
            self.link_booking(booking_id, &invoice.id).await;
        }

        Ok(InvoiceOutcome::new(&invoice, prepared.total, report))
    }

    #[instrument(skip(self, options))]
    pub async fn send_invoice(&self, invoice_id: &str, options: DeliveryOptions) -> Result<InvoiceOutcome, AppError> {
        validate_invoice_id(invoice_id)?;
        let invoice = self.gateway.retrieve_invoice(invoice_id).await?;
        let (invoice, report) = self.dispatcher.finalize_and_send(invoice, &options).await?;
        let total = invoice.total;
        Ok(InvoiceOutcome::new(&invoice, total, report))
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> Result<InvoiceView, AppError> {
        validate_invoice_id(invoice_id)?;
        Ok(self.gateway.retrieve_invoice(invoice_id).await?.into())
    }

    async fn link_booking(&self, booking_id: &str, invoice_id: &str) {
        match self.bookings.find_by_id(booking_id).await {
            Ok(Some(_)) => {
                if let Err(e) = self.bookings.attach_invoice(booking_id, invoice_id).await {
                    warn!("Failed to attach invoice {} to booking {}: {}", invoice_id, booking_id, e);
                }
            }
            Ok(None) => warn!("Invoice {} references unknown booking {}", invoice_id, booking_id),
            Err(e) => warn!("Failed to look up booking {}: {}", booking_id, e),
        }
    }
}
