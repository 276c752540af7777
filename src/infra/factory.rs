use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::domain::ports::{EmailService, MediaStore, MessagingGateway, PaymentGateway};
use crate::domain::services::notification_service::{
    BOOKING_CONFIRMATION, BOOKING_NOTIFICATION, CONTACT_NOTIFICATION, PAYMENT_FAILED,
};
use crate::error::StartupError;
use crate::state::{AppState, Ports};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::media::cloudinary_store::CloudinaryStore;
use crate::infra::payments::stripe_gateway::StripeGateway;
use crate::infra::sms::twilio_service::TwilioService;
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_webhook_event_repo::PostgresWebhookEventRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_webhook_event_repo::SqliteWebhookEventRepo,
};

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (BOOKING_NOTIFICATION, include_str!("../templates/booking_notification.html")),
        (BOOKING_CONFIRMATION, include_str!("../templates/booking_confirmation.html")),
        (CONTACT_NOTIFICATION, include_str!("../templates/contact_notification.html")),
        (PAYMENT_FAILED, include_str!("../templates/payment_failed.html")),
    ])?;
    Ok(tera)
}

/// Vendor adapters, each built only when its configuration is complete.
struct VendorPorts {
    payment_gateway: Option<Arc<dyn PaymentGateway>>,
    messaging: Option<Arc<dyn MessagingGateway>>,
    email_service: Option<Arc<dyn EmailService>>,
    media_store: Option<Arc<dyn MediaStore>>,
}

fn build_vendor_ports(config: &Config) -> Result<VendorPorts, StartupError> {
    let payment_gateway: Option<Arc<dyn PaymentGateway>> = match &config.stripe.secret_key {
        Some(key) => Some(Arc::new(StripeGateway::new(&config.stripe.api_base, key)?)),
        None => {
            warn!("STRIPE_SECRET_KEY not set; invoicing disabled");
            None
        }
    };
    if config.stripe.webhook_secret.is_none() {
        warn!("STRIPE_WEBHOOK_SECRET not set; webhook deliveries will be refused");
    }

    let messaging: Option<Arc<dyn MessagingGateway>> = match &config.twilio {
        Some(twilio) => Some(Arc::new(TwilioService::new(twilio)?)),
        None => {
            warn!("Twilio not configured; SMS disabled");
            None
        }
    };

    let email_service: Option<Arc<dyn EmailService>> = match &config.mail {
        Some(mail) => Some(Arc::new(HttpEmailService::new(mail)?)),
        None => {
            warn!("Mail relay not configured; email disabled");
            None
        }
    };

    let media_store: Option<Arc<dyn MediaStore>> = match &config.cloudinary {
        Some(cloudinary) => Some(Arc::new(CloudinaryStore::new(cloudinary)?)),
        None => {
            warn!("Cloudinary not configured; asset management disabled");
            None
        }
    };

    Ok(VendorPorts { payment_gateway, messaging, email_service, media_store })
}

pub async fn bootstrap_state(config: &Config) -> Result<AppState, StartupError> {
    let database_url = &config.database_url;
    let vendors = build_vendor_ports(config)?;
    let templates = Arc::new(load_templates()?);

    let ports = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse()?;
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        run_postgres_migrations(&pool).await?;

        Ports {
            booking_repo: Arc::new(PostgresBookingRepo::new(pool.clone())),
            webhook_event_repo: Arc::new(PostgresWebhookEventRepo::new(pool)),
            payment_gateway: vendors.payment_gateway,
            messaging: vendors.messaging,
            email_service: vendors.email_service,
            media_store: vendors.media_store,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        run_sqlite_migrations(&pool).await?;

        Ports {
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            webhook_event_repo: Arc::new(SqliteWebhookEventRepo::new(pool)),
            payment_gateway: vendors.payment_gateway,
            messaging: vendors.messaging,
            email_service: vendors.email_service,
            media_store: vendors.media_store,
        }
    };

    Ok(AppState::new(config.clone(), ports, templates))
}

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), StartupError> {
    sqlx::migrate!("./migrations/postgres").run(pool).await?;
    Ok(())
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), StartupError> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await?;
    Ok(())
}
