use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub webhook_tolerance_secs: i64,
}

#[derive(Clone, Debug)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub service_url: String,
    pub service_token: String,
    pub from_alias: String,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Clone, Debug)]
pub struct InvoiceSettings {
    pub currency: String,
    /// Major units.
    pub default_deposit: f64,
    pub days_until_due: u32,
}

#[derive(Clone, Debug)]
pub struct RateLimits {
    pub contact_per_minute: u32,
    pub booking_per_minute: u32,
    pub invoice_per_minute: u32,
    /// Key on the first `X-Forwarded-For` hop. Only safe behind a proxy that overwrites it.
    pub trust_forwarded_for: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub frontend_origin: Option<String>,
    pub admin_api_token: Option<String>,
    pub business_name: String,
    pub business_email: Option<String>,
    pub business_phone: Option<String>,
    pub invoice: InvoiceSettings,
    pub stripe: StripeConfig,
    pub twilio: Option<TwilioConfig>,
    pub mail: Option<MailConfig>,
    pub cloudinary: Option<CloudinaryConfig>,
    pub rate_limits: RateLimits,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let twilio = match (opt("TWILIO_ACCOUNT_SID"), opt("TWILIO_AUTH_TOKEN"), opt("TWILIO_FROM_NUMBER")) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioConfig { account_sid, auth_token, from_number }),
            _ => None,
        };

        let mail = match (opt("MAIL_SERVICE_URL"), opt("MAIL_SERVICE_TOKEN")) {
            (Some(service_url), Some(service_token)) => Some(MailConfig {
                service_url,
                service_token,
                from_alias: opt("MAIL_FROM_ALIAS").unwrap_or_else(|| "default".to_string()),
            }),
            _ => None,
        };

        let cloudinary = match (opt("CLOUDINARY_CLOUD_NAME"), opt("CLOUDINARY_API_KEY"), opt("CLOUDINARY_API_SECRET")) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig { cloud_name, api_key, api_secret }),
            _ => None,
        };

        Ok(Self {
            database_url: opt("DATABASE_URL").unwrap_or_else(|| "sqlite://detailing.db?mode=rwc".to_string()),
            port: parsed("PORT", 3001)?,
            frontend_origin: opt("FRONTEND_ORIGIN"),
            admin_api_token: opt("ADMIN_API_TOKEN"),
            business_name: opt("BUSINESS_NAME").unwrap_or_else(|| "Mobile Detailing".to_string()),
            business_email: opt("BUSINESS_EMAIL"),
            business_phone: opt("BUSINESS_PHONE"),
            invoice: InvoiceSettings {
                currency: opt("INVOICE_CURRENCY").unwrap_or_else(|| "usd".to_string()).to_lowercase(),
                default_deposit: parsed("INVOICE_DEFAULT_DEPOSIT", 0.0)?,
                days_until_due: parsed("INVOICE_DAYS_UNTIL_DUE", 7)?,
            },
            stripe: StripeConfig {
                secret_key: opt("STRIPE_SECRET_KEY"),
                webhook_secret: opt("STRIPE_WEBHOOK_SECRET"),
                api_base: opt("STRIPE_API_BASE").unwrap_or_else(|| "https://api.stripe.com".to_string()),
                webhook_tolerance_secs: parsed("STRIPE_WEBHOOK_TOLERANCE_SECS", 300)?,
            },
            twilio,
            mail,
            cloudinary,
            rate_limits: RateLimits {
                contact_per_minute: parsed("RATE_LIMIT_CONTACT", 5)?,
                booking_per_minute: parsed("RATE_LIMIT_BOOKING", 10)?,
                invoice_per_minute: parsed("RATE_LIMIT_INVOICE", 30)?,
                trust_forwarded_for: parsed("TRUST_FORWARDED_FOR", false)?,
            },
        })
    }
}

/// Unset and blank variables are both treated as absent.
fn opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match opt(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
