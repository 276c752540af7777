use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{error, info, instrument};

use crate::config::CloudinaryConfig;
use crate::domain::models::asset::{Asset, NewUpload};
use crate::domain::ports::MediaStore;
use crate::error::AppError;

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const LIST_PAGE_SIZE: u32 = 100;

/// Cloudinary image storage: signed uploads and Admin API lookups.
pub struct CloudinaryStore {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct Resource {
    public_id: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    secure_url: String,
    format: Option<String>,
    #[serde(default = "default_resource_type")]
    resource_type: String,
    #[serde(default)]
    bytes: u64,
    width: Option<u32>,
    height: Option<u32>,
    created_at: Option<String>,
}

fn default_resource_type() -> String {
    "image".to_string()
}

impl From<Resource> for Asset {
    fn from(r: Resource) -> Self {
        Self {
            public_id: r.public_id,
            url: r.url,
            secure_url: r.secure_url,
            format: r.format,
            resource_type: r.resource_type,
            bytes: r.bytes,
            width: r.width,
            height: r.height,
            created_at: r.created_at,
        }
    }
}

#[derive(Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Deserialize)]
struct DestroyResult {
    result: String,
}

#[derive(Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

/// Hex SHA-256 over the alphabetically sorted `key=value` pairs joined by `&`,
/// followed directly by the API secret.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryStore {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build Cloudinary client: {}", e)))?;
        Ok(Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", CLOUDINARY_API_BASE, self.cloud_name, path)
    }

    async fn read<T: for<'de> Deserialize<'de>>(res: reqwest::Response, action: &str) -> Result<T, AppError> {
        let status = res.status();
        if !status.is_success() {
            let message = res
                .json::<CloudinaryErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("Media provider responded with {}", status));
            error!("Cloudinary {} failed ({}): {}", action, status, message);
            return Err(AppError::Provider(message));
        }
        res.json::<T>().await.map_err(|e| AppError::Provider(format!("Unexpected media provider response: {}", e)))
    }

    fn connection_error(action: &str, e: reqwest::Error) -> AppError {
        error!("Cloudinary {} connection error: {}", action, e);
        AppError::Provider(format!("Media provider unreachable: {}", e))
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    #[instrument(skip(self, upload), fields(file = %upload.file_name, size = upload.data.len()))]
    async fn upload(&self, upload: NewUpload) -> Result<Asset, AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let folder = upload.folder.clone().unwrap_or_default();
        let signature = sign_params(&[("folder", folder.clone()), ("timestamp", timestamp.clone())], &self.api_secret);

        let file = multipart::Part::bytes(upload.data)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| AppError::Validation(format!("Invalid content type: {}", e)))?;

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        if !folder.is_empty() {
            form = form.text("folder", folder);
        }

        let res = self.client.post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::connection_error("upload", e))?;

        let resource: Resource = Self::read(res, "upload").await?;
        info!("Uploaded asset {}", resource.public_id);
        Ok(resource.into())
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> Result<(), AppError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(&[("public_id", public_id.to_string()), ("timestamp", timestamp.clone())], &self.api_secret);
        let form = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];

        let res = self.client.post(self.endpoint("image/destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| Self::connection_error("destroy", e))?;

        let outcome: DestroyResult = Self::read(res, "destroy").await?;
        match outcome.result.as_str() {
            "ok" => Ok(()),
            "not found" => Err(AppError::NotFound(format!("Asset {} not found", public_id))),
            other => Err(AppError::Provider(format!("Unexpected destroy result: {}", other))),
        }
    }

    #[instrument(skip(self))]
    async fn resource(&self, public_id: &str) -> Result<Option<Asset>, AppError> {
        let res = self.client.get(self.endpoint(&format!("resources/image/upload/{}", public_id)))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .send()
            .await
            .map_err(|e| Self::connection_error("lookup", e))?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resource: Resource = Self::read(res, "lookup").await?;
        Ok(Some(resource.into()))
    }

    #[instrument(skip(self))]
    async fn list(&self, folder: Option<&str>) -> Result<Vec<Asset>, AppError> {
        let mut query = vec![("max_results", LIST_PAGE_SIZE.to_string())];
        if let Some(folder) = folder {
            query.push(("prefix", format!("{}/", folder.trim_end_matches('/'))));
        }

        let res = self.client.get(self.endpoint("resources/image/upload"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&query)
            .send()
            .await
            .map_err(|e| Self::connection_error("list", e))?;

        let list: ResourceList = Self::read(res, "list").await?;
        Ok(list.resources.into_iter().map(Asset::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let sig = sign_params(&[("timestamp", "1315060510".into()), ("public_id", "sample_image".into())], "abcd");
        let expected = {
            let mut h = Sha256::new();
            h.update(b"public_id=sample_image&timestamp=1315060510abcd");
            hex::encode(h.finalize())
        };
        assert_eq!(sig, expected);
    }

    #[test]
    fn test_empty_params_are_not_signed() {
        let with_empty = sign_params(&[("folder", String::new()), ("timestamp", "1".into())], "s");
        let without = sign_params(&[("timestamp", "1".into())], "s");
        assert_eq!(with_empty, without);
    }
}
