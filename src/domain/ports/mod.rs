use crate::domain::models::{
    asset::{Asset, NewUpload},
    booking::{Booking, BookingStatus},
    invoice::{NewCustomer, NewInvoice, NewInvoiceItem, ProviderInvoice},
    webhook::WebhookEventRecord,
};
use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list(&self) -> Result<Vec<Booking>, AppError>;
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError>;
    async fn attach_invoice(&self, id: &str, invoice_id: &str) -> Result<(), AppError>;
}

/// Ledger of webhook deliveries, used to drop duplicates.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Returns `false` when the event id was already recorded.
    async fn record(&self, event_id: &str, event_type: &str) -> Result<bool, AppError>;
    async fn mark(&self, event_id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
    async fn find(&self, event_id: &str) -> Result<Option<WebhookEventRecord>, AppError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the provider's customer id.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, AppError>;
    async fn create_invoice_item(&self, item: &NewInvoiceItem) -> Result<(), AppError>;
    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<ProviderInvoice, AppError>;
    async fn finalize_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError>;
    async fn send_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError>;
    async fn retrieve_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError>;
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Returns the provider's message id.
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, reply_to: Option<&str>) -> Result<(), AppError>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, upload: NewUpload) -> Result<Asset, AppError>;
    async fn destroy(&self, public_id: &str) -> Result<(), AppError>;
    async fn resource(&self, public_id: &str) -> Result<Option<Asset>, AppError>;
    async fn list(&self, folder: Option<&str>) -> Result<Vec<Asset>, AppError>;
}
