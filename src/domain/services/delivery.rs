use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::models::invoice::{DeliveryOptions, DeliveryReport, InvoiceStatus, ProviderInvoice};
use crate::domain::models::money::to_major_units;
use crate::domain::ports::{MessagingGateway, PaymentGateway};
use crate::error::AppError;

/// Finalizes invoices and pushes them out over email and SMS.
///
/// Finalization failures are errors. Channel failures are not: each channel is
/// attempted independently and reported as a boolean, because the hosted
/// invoice link stays reachable either way.
pub struct DeliveryDispatcher {
    gateway: Arc<dyn PaymentGateway>,
    messaging: Option<Arc<dyn MessagingGateway>>,
    business_name: String,
}

impl DeliveryDispatcher {
    pub fn new(gateway: Arc<dyn PaymentGateway>, messaging: Option<Arc<dyn MessagingGateway>>, business_name: String) -> Self {
        Self { gateway, messaging, business_name }
    }

    pub async fn finalize_and_send(
        &self,
        invoice: ProviderInvoice,
        options: &DeliveryOptions,
    ) -> Result<(ProviderInvoice, DeliveryReport), AppError> {
        let mut invoice = match invoice.status {
            InvoiceStatus::Draft => {
                let finalized = self.gateway.finalize_invoice(&invoice.id).await?;
                info!("Invoice {} finalized (status: {:?})", finalized.id, finalized.status);
                finalized
            }
            InvoiceStatus::Open => invoice,
            other => {
                return Err(AppError::Conflict(format!("Invoice cannot be sent in status {:?}", other)));
            }
        };

        let mut report = DeliveryReport::default();

        if options.send_via_email {
            match self.gateway.send_invoice(&invoice.id).await {
                Ok(sent) => {
                    info!("Invoice {} emailed to customer", sent.id);
                    invoice = sent;
                    report.email_sent = true;
                }
                Err(e) => warn!("Invoice {} email delivery failed: {}", invoice.id, e),
            }
        }

        if options.send_via_sms {
            report.sms_sent = self.send_sms(&invoice, options.customer_phone.as_deref()).await;
        }

        Ok((invoice, report))
    }

    async fn send_sms(&self, invoice: &ProviderInvoice, phone: Option<&str>) -> bool {
        let Some(messaging) = &self.messaging else {
            warn!("SMS requested for invoice {} but SMS is not configured", invoice.id);
            return false;
        };
        let Some(phone) = phone.or(invoice.customer_phone.as_deref()).filter(|p| !p.trim().is_empty()) else {
            warn!("SMS requested for invoice {} but no phone number is known", invoice.id);
            return false;
        };
        let Some(url) = invoice.hosted_invoice_url.as_deref() else {
            warn!("SMS requested for invoice {} but it has no hosted URL", invoice.id);
            return false;
        };

        let body = sms_body(&self.business_name, invoice, url);

        match messaging.send_sms(phone, &body).await {
            Ok(message_id) => {
                info!("Invoice {} link sent by SMS (message {})", invoice.id, message_id);
                true
            }
            Err(e) => {
                warn!("Invoice {} SMS delivery failed: {}", invoice.id, e);
                false
            }
        }
    }
}

pub fn sms_body(business_name: &str, invoice: &ProviderInvoice, url: &str) -> String {
    let label = invoice.number.as_deref().map(|n| format!("invoice {}", n)).unwrap_or_else(|| "your invoice".to_string());
    format!(
        "{}: {} for ${:.2} is ready. View and pay here: {}",
        business_name,
        label,
        to_major_units(invoice.amount_due),
        url
    )
}
