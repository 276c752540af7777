use crate::config::MailConfig;
use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, instrument};

/// Sends mail through an HTTP relay that accepts a JSON message and a bearer token.
pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
    from_alias: String,
}

impl HttpEmailService {
    pub fn new(config: &MailConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build mail client: {}", e)))?;
        Ok(Self {
            client,
            api_url: config.service_url.clone(),
            api_key: config.service_token.clone(),
            from_alias: config.from_alias.clone(),
        })
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from_alias: &'a str,
    to_addr: &'a str,
    subject: &'a str,
    html_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[async_trait]
impl EmailService for HttpEmailService {
    #[instrument(skip(self, html_body))]
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, reply_to: Option<&str>) -> Result<(), AppError> {
        let payload = EmailPayload {
            from_alias: &self.from_alias,
            to_addr: recipient,
            subject,
            html_body,
            reply_to,
        };

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email service connection error: {}", e);
                error!("{}", msg);
                AppError::Provider(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            error!("Email service failed. Status: {}, Body: {}", status, text);
            return Err(AppError::Provider(format!("Email service responded with {}", status)));
        }

        Ok(())
    }
}
