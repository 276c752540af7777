use std::sync::Arc;

use serde::Serialize;
use tera::Tera;
use tracing::info;

use crate::api::rate_limit::RateLimiters;
use crate::config::Config;
use crate::domain::ports::{
    BookingRepository, EmailService, MediaStore, MessagingGateway, PaymentGateway, WebhookEventRepository,
};
use crate::domain::services::{
    invoice_service::InvoiceService,
    notification_service::{BusinessContact, NotificationService},
    signature::SignatureVerifier,
    webhook_router::WebhookRouter,
};
use crate::error::AppError;

/// Vendor integrations whose configuration was present at startup.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Capabilities {
    pub payments: bool,
    pub webhooks: bool,
    pub sms: bool,
    pub email: bool,
    pub media: bool,
    pub admin: bool,
}

/// Adapters handed to `AppState::new`. Vendor ports are `None` when unconfigured.
pub struct Ports {
    pub booking_repo: Arc<dyn BookingRepository>,
    pub webhook_event_repo: Arc<dyn WebhookEventRepository>,
    pub payment_gateway: Option<Arc<dyn PaymentGateway>>,
    pub messaging: Option<Arc<dyn MessagingGateway>>,
    pub email_service: Option<Arc<dyn EmailService>>,
    pub media_store: Option<Arc<dyn MediaStore>>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub capabilities: Capabilities,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub webhook_event_repo: Arc<dyn WebhookEventRepository>,
    pub media_store: Option<Arc<dyn MediaStore>>,
    pub notifications: Arc<NotificationService>,
    pub invoice_service: Option<Arc<InvoiceService>>,
    pub webhook_router: Arc<WebhookRouter>,
    pub signature_verifier: Option<SignatureVerifier>,
    pub rate_limiters: RateLimiters,
}

impl AppState {
    pub fn new(config: Config, ports: Ports, templates: Arc<Tera>) -> Self {
        let capabilities = Capabilities {
            payments: ports.payment_gateway.is_some(),
            webhooks: config.stripe.webhook_secret.is_some(),
            sms: ports.messaging.is_some(),
            email: ports.email_service.is_some(),
            media: ports.media_store.is_some(),
            admin: config.admin_api_token.is_some(),
        };
        info!(?capabilities, "Capabilities resolved");

        let notifications = Arc::new(NotificationService::new(
            ports.email_service.clone(),
            ports.messaging.clone(),
            templates,
            BusinessContact {
                name: config.business_name.clone(),
                email: config.business_email.clone(),
                phone: config.business_phone.clone(),
            },
        ));

        let invoice_service = ports.payment_gateway.map(|gateway| {
            Arc::new(InvoiceService::new(
                gateway,
                ports.messaging.clone(),
                ports.booking_repo.clone(),
                config.invoice.clone(),
                config.business_name.clone(),
            ))
        });

        let webhook_router = Arc::new(WebhookRouter::new(
            ports.webhook_event_repo.clone(),
            ports.booking_repo.clone(),
            notifications.clone(),
        ));

        let signature_verifier = config
            .stripe
            .webhook_secret
            .as_ref()
            .map(|secret| SignatureVerifier::new(secret.clone(), config.stripe.webhook_tolerance_secs));

        let rate_limiters = RateLimiters::new(&config.rate_limits);

        Self {
            config,
            capabilities,
            booking_repo: ports.booking_repo,
            webhook_event_repo: ports.webhook_event_repo,
            media_store: ports.media_store,
            notifications,
            invoice_service,
            webhook_router,
            signature_verifier,
            rate_limiters,
        }
    }

    pub fn invoices(&self) -> Result<&InvoiceService, AppError> {
        self.invoice_service
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("Payment provider is not configured".into()))
    }

    pub fn media(&self) -> Result<&dyn MediaStore, AppError> {
        self.media_store
            .as_deref()
            .ok_or_else(|| AppError::Unavailable("Media storage is not configured".into()))
    }

    pub fn webhook_verifier(&self) -> Result<&SignatureVerifier, AppError> {
        self.signature_verifier
            .as_ref()
            .ok_or_else(|| AppError::Unavailable("Webhook secret is not configured".into()))
    }
}
