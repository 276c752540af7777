#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use detailing_backend::{
    api::router::create_router,
    config::{Config, InvoiceSettings, RateLimits, StripeConfig},
    domain::models::asset::{Asset, NewUpload},
    domain::models::invoice::{InvoiceStatus, NewCustomer, NewInvoice, NewInvoiceItem, ProviderInvoice},
    domain::ports::{EmailService, MediaStore, MessagingGateway, PaymentGateway},
    error::AppError,
    infra::factory::load_templates,
    infra::repositories::{sqlite_booking_repo::SqliteBookingRepo, sqlite_webhook_event_repo::SqliteWebhookEventRepo},
    state::{AppState, Ports},
};
use serde_json::Value;
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const BUSINESS_EMAIL: &str = "owner@shine.test";
pub const BUSINESS_PHONE: &str = "+15550009999";

#[derive(Default)]
pub struct MockPaymentGateway {
    pub calls: Mutex<Vec<String>>,
    pub items: Mutex<Vec<NewInvoiceItem>>,
    pending: Mutex<Vec<NewInvoiceItem>>,
    invoices: Mutex<HashMap<String, ProviderInvoice>>,
    pub fail_send: bool,
}

impl MockPaymentGateway {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn insert(&self, invoice: ProviderInvoice) {
        self.invoices.lock().unwrap().insert(invoice.id.clone(), invoice);
    }

    fn update(&self, invoice_id: &str, apply: impl FnOnce(&mut ProviderInvoice)) -> Result<ProviderInvoice, AppError> {
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices
            .get_mut(invoice_id)
            .ok_or_else(|| AppError::Provider(format!("No such invoice: '{}'", invoice_id)))?;
        apply(invoice);
        Ok(invoice.clone())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, AppError> {
        self.record(format!("create_customer:{}", customer.name));
        Ok("cus_test".to_string())
    }

    async fn create_invoice_item(&self, item: &NewInvoiceItem) -> Result<(), AppError> {
        self.record(format!("create_invoice_item:{}", item.unit_amount));
        self.items.lock().unwrap().push(item.clone());
        self.pending.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<ProviderInvoice, AppError> {
        self.record("create_invoice".to_string());
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        let total: i64 = pending.iter().map(|i| i.unit_amount * i64::from(i.quantity)).sum();
        let created = ProviderInvoice {
            id: format!("in_{}", self.invoices.lock().unwrap().len() + 1),
            number: None,
            status: InvoiceStatus::Draft,
            customer_id: invoice.customer_id.clone(),
            customer_name: None,
            customer_email: None,
            customer_phone: None,
            total,
            amount_due: total,
            amount_paid: 0,
            amount_remaining: total,
            currency: invoice.currency.clone(),
            hosted_invoice_url: None,
            invoice_pdf: None,
            due_date: None,
            booking_id: invoice.booking_id.clone(),
        };
        self.insert(created.clone());
        Ok(created)
    }

    async fn finalize_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError> {
        self.record(format!("finalize_invoice:{}", invoice_id));
        self.update(invoice_id, |invoice| {
            invoice.status = InvoiceStatus::Open;
            invoice.number = Some("TEST-0001".to_string());
            invoice.hosted_invoice_url = Some(format!("https://pay.test/{}", invoice.id));
        })
    }

    async fn send_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError> {
        self.record(format!("send_invoice:{}", invoice_id));
        if self.fail_send {
            return Err(AppError::Provider("Invoice email bounced".into()));
        }
        self.update(invoice_id, |_| {})
    }

    async fn retrieve_invoice(&self, invoice_id: &str) -> Result<ProviderInvoice, AppError> {
        self.record(format!("retrieve_invoice:{}", invoice_id));
        self.update(invoice_id, |_| {})
    }
}

#[derive(Default)]
pub struct MockMessaging {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessagingGateway for MockMessaging {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, AppError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((to.to_string(), body.to_string()));
        Ok(format!("SM{}", sent.len()))
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub reply_to: Option<String>,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, reply_to: Option<&str>) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            reply_to: reply_to.map(str::to_string),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MockMediaStore {
    pub assets: Mutex<HashMap<String, Asset>>,
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(&self, upload: NewUpload) -> Result<Asset, AppError> {
        let stem = upload.file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&upload.file_name).to_string();
        let public_id = match &upload.folder {
            Some(folder) => format!("{}/{}", folder, stem),
            None => stem,
        };
        let asset = Asset {
            public_id: public_id.clone(),
            url: format!("http://media.test/{}", public_id),
            secure_url: format!("https://media.test/{}", public_id),
            format: upload.content_type.strip_prefix("image/").map(str::to_string),
            resource_type: "image".to_string(),
            bytes: upload.data.len() as u64,
            width: None,
            height: None,
            created_at: None,
        };
        self.assets.lock().unwrap().insert(public_id, asset.clone());
        Ok(asset)
    }

    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        self.assets
            .lock()
            .unwrap()
            .remove(public_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Asset {} not found", public_id)))
    }

    async fn resource(&self, public_id: &str) -> Result<Option<Asset>, AppError> {
        Ok(self.assets.lock().unwrap().get(public_id).cloned())
    }

    async fn list(&self, folder: Option<&str>) -> Result<Vec<Asset>, AppError> {
        let assets = self.assets.lock().unwrap();
        let mut listed: Vec<Asset> = assets
            .values()
            .filter(|a| folder.is_none_or(|f| a.public_id.starts_with(&format!("{}/", f))))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.public_id.cmp(&b.public_id));
        Ok(listed)
    }
}

/// Which collaborators a test app gets.
pub struct TestOptions {
    pub vendors: bool,
    pub admin_token: bool,
    pub webhook_secret: bool,
    pub fail_invoice_email: bool,
    pub contact_per_minute: u32,
    pub trust_forwarded_for: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            vendors: true,
            admin_token: true,
            webhook_secret: true,
            fail_invoice_email: false,
            contact_per_minute: 1000,
            trust_forwarded_for: false,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub payments: Arc<MockPaymentGateway>,
    pub messaging: Arc<MockMessaging>,
    pub email: Arc<MockEmailService>,
    pub media: Arc<MockMediaStore>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let templates = Arc::new(load_templates().expect("Failed to load templates"));

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            frontend_origin: None,
            admin_api_token: options.admin_token.then(|| ADMIN_TOKEN.to_string()),
            business_name: "Shine Mobile Detailing".to_string(),
            business_email: Some(BUSINESS_EMAIL.to_string()),
            business_phone: Some(BUSINESS_PHONE.to_string()),
            invoice: InvoiceSettings { currency: "usd".to_string(), default_deposit: 0.0, days_until_due: 7 },
            stripe: StripeConfig {
                secret_key: options.vendors.then(|| "sk_test".to_string()),
                webhook_secret: options.webhook_secret.then(|| WEBHOOK_SECRET.to_string()),
                api_base: "http://localhost".to_string(),
                webhook_tolerance_secs: 300,
            },
            twilio: None,
            mail: None,
            cloudinary: None,
            rate_limits: RateLimits {
                contact_per_minute: options.contact_per_minute,
                booking_per_minute: 1000,
                invoice_per_minute: 1000,
                trust_forwarded_for: options.trust_forwarded_for,
            },
        };

        let payments = Arc::new(MockPaymentGateway { fail_send: options.fail_invoice_email, ..Default::default() });
        let messaging = Arc::new(MockMessaging::default());
        let email = Arc::new(MockEmailService::default());
        let media = Arc::new(MockMediaStore::default());

        let ports = Ports {
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            webhook_event_repo: Arc::new(SqliteWebhookEventRepo::new(pool.clone())),
            payment_gateway: options.vendors.then(|| payments.clone() as Arc<dyn PaymentGateway>),
            messaging: options.vendors.then(|| messaging.clone() as Arc<dyn MessagingGateway>),
            email_service: options.vendors.then(|| email.clone() as Arc<dyn EmailService>),
            media_store: options.vendors.then(|| media.clone() as Arc<dyn MediaStore>),
        };

        let state = Arc::new(AppState::new(config, ports, templates));
        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, payments, messaging, email, media }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>, admin: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if admin {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
