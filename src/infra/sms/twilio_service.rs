use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, instrument};

use crate::config::TwilioConfig;
use crate::domain::ports::MessagingGateway;
use crate::error::AppError;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub struct TwilioService {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Deserialize)]
struct TwilioError {
    message: Option<String>,
    code: Option<i64>,
}

impl TwilioService {
    pub fn new(config: &TwilioConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build Twilio client: {}", e)))?;
        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }
}

#[async_trait]
impl MessagingGateway for TwilioService {
    #[instrument(skip(self, body))]
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, AppError> {
        let url = format!("{}/Accounts/{}/Messages.json", TWILIO_API_BASE, self.account_sid);
        let form = [("To", to), ("From", self.from_number.as_str()), ("Body", body)];

        let res = self.client.post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!("Twilio connection error: {}", e);
                AppError::Provider(format!("SMS provider unreachable: {}", e))
            })?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.json::<TwilioError>().await.ok();
            let code = detail.as_ref().and_then(|d| d.code);
            let message = detail
                .and_then(|d| d.message)
                .unwrap_or_else(|| format!("SMS provider responded with {}", status));
            error!("Twilio rejected message ({:?}): {}", code, message);
            return Err(AppError::Provider(message));
        }

        let message: MessageResource = res
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Unexpected SMS provider response: {}", e)))?;
        Ok(message.sid)
    }
}
