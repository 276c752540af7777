use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{error, instrument};

use crate::domain::models::invoice::{
    validate_invoice_id, InvoiceStatus, NewCustomer, NewInvoice, NewInvoiceItem, ProviderInvoice,
};
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;

const BOOKING_METADATA_KEY: &str = "bookingId";

/// Stripe REST client. Requests are form-encoded with bearer auth; nothing is retried.
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct StripeObjectId {
    id: String,
}

#[derive(Deserialize)]
struct StripeInvoice {
    id: String,
    number: Option<String>,
    status: Option<InvoiceStatus>,
    customer: String,
    customer_name: Option<String>,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    #[serde(default)]
    total: i64,
    #[serde(default)]
    amount_due: i64,
    #[serde(default)]
    amount_paid: i64,
    #[serde(default)]
    amount_remaining: i64,
    currency: String,
    hosted_invoice_url: Option<String>,
    invoice_pdf: Option<String>,
    due_date: Option<i64>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl From<StripeInvoice> for ProviderInvoice {
    fn from(mut invoice: StripeInvoice) -> Self {
        Self {
            id: invoice.id,
            number: invoice.number,
            status: invoice.status.unwrap_or(InvoiceStatus::Draft),
            customer_id: invoice.customer,
            customer_name: invoice.customer_name,
            customer_email: invoice.customer_email,
            customer_phone: invoice.customer_phone,
            total: invoice.total,
            amount_due: invoice.amount_due,
            amount_paid: invoice.amount_paid,
            amount_remaining: invoice.amount_remaining,
            currency: invoice.currency,
            hosted_invoice_url: invoice.hosted_invoice_url,
            invoice_pdf: invoice.invoice_pdf,
            due_date: invoice.due_date,
            booking_id: invoice.metadata.remove(BOOKING_METADATA_KEY),
        }
    }
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build Stripe client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, form: &[(String, String)]) -> Result<T, AppError> {
        let url = format!("{}/v1/{}", self.api_base, path);
        let mut request = self.client.request(method, &url).bearer_auth(&self.secret_key);
        if !form.is_empty() {
            request = request.form(form);
        }

        let res = request.send().await.map_err(|e| {
            error!("Stripe request to {} failed: {}", path, e);
            AppError::Provider(format!("Payment provider unreachable: {}", e))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| AppError::Provider(format!("Payment provider response unreadable: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| {
                    error!("Stripe {} error on {}: {:?}", status, path, b.error.kind);
                    b.error.message
                })
                .unwrap_or_else(|| format!("Payment provider responded with {}", status));
            return Err(AppError::Provider(message));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!("Unexpected Stripe response on {}: {}", path, e);
            AppError::Provider("Unexpected payment provider response".into())
        })
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, form: &[(String, String)]) -> Result<T, AppError> {
        self.call(Method::POST, path, form).await
    }
}

/// Invoice ids are interpolated into the request path.
pub fn invoice_path(invoice_id: &str, action: Option<&str>) -> Result<String, AppError> {
    validate_invoice_id(invoice_id)?;
    Ok(match action {
        Some(action) => format!("invoices/{}/{}", invoice_id, action),
        None => format!("invoices/{}", invoice_id),
    })
}

fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

pub fn customer_form(customer: &NewCustomer) -> Vec<(String, String)> {
    let mut form = vec![param("name", &customer.name)];
    if let Some(email) = &customer.email {
        form.push(param("email", email));
    }
    if let Some(phone) = &customer.phone {
        form.push(param("phone", phone));
    }
    if let Some(booking_id) = &customer.booking_id {
        form.push(param(&format!("metadata[{}]", BOOKING_METADATA_KEY), booking_id));
    }
    form
}

/// Credits are sent as a flat negative `amount`, since `unit_amount` must not be negative.
pub fn invoice_item_form(item: &NewInvoiceItem) -> Vec<(String, String)> {
    let mut form = vec![
        param("customer", &item.customer_id),
        param("description", &item.description),
        param("currency", &item.currency),
    ];
    if item.unit_amount < 0 {
        form.push(param("amount", item.unit_amount.saturating_mul(i64::from(item.quantity))));
    } else {
        form.push(param("unit_amount", item.unit_amount));
        form.push(param("quantity", item.quantity));
    }
    form
}

pub fn invoice_form(invoice: &NewInvoice) -> Vec<(String, String)> {
    let mut form = vec![
        param("customer", &invoice.customer_id),
        param("currency", &invoice.currency),
        param("collection_method", "send_invoice"),
        param("days_until_due", invoice.days_until_due),
        param("pending_invoice_items_behavior", "include"),
        param("auto_advance", "false"),
    ];
    if let Some(booking_id) = &invoice.booking_id {
        form.push(param(&format!("metadata[{}]", BOOKING_METADATA_KEY), booking_id));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, customer), fields(name = %customer.name))]
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, AppError> {
        let created: StripeObjectId = self.post("customers", &customer_form(customer)).await?;
        Ok(created.id)
    }

    #[instrument(skip(self, item), fields(customer = %item.customer_id, unit_amount = item.unit_amount))]
    async fn create_invoice_item(&self, item: &NewInvoiceItem) -> Result<(), AppError> {
        let _: StripeObjectId = self.post("invoiceitems", &invoice_item_form(item)).await?;
        Ok(())
    }

    #[instrument(skip(self, invoice), fields(customer = %invoice.customer_id))]
    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<ProviderInvoice, AppError> {
        let created: StripeInvoice = self.post("invoices", &invoice_form(invoice)).await?;
        Ok(created.into())
    }

    #[instrument(skip(self))]
    async fn finalize_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError> {
        let form = [param("auto_advance", "false")];
        let invoice: StripeInvoice = self.post(&invoice_path(invoice_id, Some("finalize"))?, &form).await?;
        Ok(invoice.into())
    }

    #[instrument(skip(self))]
    async fn send_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError> {
        let invoice: StripeInvoice = self.post(&invoice_path(invoice_id, Some("send"))?, &[]).await?;
        Ok(invoice.into())
    }

    #[instrument(skip(self))]
    async fn retrieve_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError> {
        let invoice: StripeInvoice = self.call(Method::GET, &invoice_path(invoice_id, None)?, &[]).await?;
        Ok(invoice.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(form: &[(String, String)], key: &str, value: &str) -> bool {
        form.iter().any(|(k, v)| k == key && v == value)
    }

    #[test]
    fn test_invoice_path_accepts_only_invoice_ids() {
        assert_eq!(invoice_path("in_1NqK2x", None).unwrap(), "invoices/in_1NqK2x");
        assert_eq!(invoice_path("in_1NqK2x", Some("send")).unwrap(), "invoices/in_1NqK2x/send");
        for bad in ["", "in_", "cus_123", "in_1/../../customers", "in_1?expand=x", "in_1%2F"] {
            assert!(matches!(invoice_path(bad, None), Err(AppError::Validation(_))), "{} accepted", bad);
        }
    }

    #[test]
    fn test_positive_item_uses_unit_amount() {
        let form = invoice_item_form(&NewInvoiceItem {
            customer_id: "cus_1".into(),
            description: "Wash".into(),
            unit_amount: 3000,
            quantity: 2,
            currency: "usd".into(),
        });
        assert!(has(&form, "unit_amount", "3000"));
        assert!(has(&form, "quantity", "2"));
        assert!(!form.iter().any(|(k, _)| k == "amount"));
    }

    #[test]
    fn test_credit_item_uses_negative_amount() {
        let form = invoice_item_form(&NewInvoiceItem {
            customer_id: "cus_1".into(),
            description: "Deposit credit".into(),
            unit_amount: -1000,
            quantity: 1,
            currency: "usd".into(),
        });
        assert!(has(&form, "amount", "-1000"));
        assert!(!form.iter().any(|(k, _)| k == "unit_amount"));
    }

    #[test]
    fn test_invoice_form_mirrors_booking_id() {
        let form = invoice_form(&NewInvoice {
            customer_id: "cus_1".into(),
            currency: "usd".into(),
            days_until_due: 14,
            booking_id: Some("b-1".into()),
        });
        assert!(has(&form, "collection_method", "send_invoice"));
        assert!(has(&form, "days_until_due", "14"));
        assert!(has(&form, "metadata[bookingId]", "b-1"));
    }

    #[test]
    fn test_invoice_response_mapping() {
        let raw = r#"{
            "id": "in_1", "object": "invoice", "number": "ABC-0001", "status": "open",
            "customer": "cus_1", "customer_email": "a@b.com", "customer_name": "A", "customer_phone": null,
            "total": 2000, "amount_due": 2000, "amount_paid": 0, "amount_remaining": 2000,
            "currency": "usd", "hosted_invoice_url": "https://invoice.stripe.com/i/x",
            "invoice_pdf": null, "due_date": 1700600000, "metadata": {"bookingId": "b-1"}
        }"#;
        let invoice: ProviderInvoice = serde_json::from_str::<StripeInvoice>(raw).unwrap().into();
        assert_eq!(invoice.status, InvoiceStatus::Open);
        assert_eq!(invoice.booking_id.as_deref(), Some("b-1"));
        assert_eq!(invoice.amount_due, 2000);
    }
}
