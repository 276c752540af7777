use axum::{extract::{Multipart, Path, Query, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::AssetListQuery;
use crate::api::extractors::admin::AdminAuth;
use crate::domain::models::asset::NewUpload;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

fn clean_folder(folder: Option<String>) -> Result<Option<String>, AppError> {
    let Some(folder) = folder.map(|f| f.trim().trim_matches('/').to_string()).filter(|f| !f.is_empty()) else {
        return Ok(None);
    };
    let valid = folder.split('/').all(|segment| {
        !segment.is_empty() && segment != ".." && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });
    if !valid {
        return Err(AppError::Validation("Invalid folder name".into()));
    }
    Ok(Some(folder))
}

pub async fn upload_asset(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let media = state.media()?;

    let mut folder = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))? {
        match field.name() {
            Some("folder") => {
                folder = Some(field.text().await.map_err(|e| AppError::Validation(format!("Invalid folder field: {}", e)))?);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                if !content_type.starts_with("image/") {
                    return Err(AppError::Validation("Only image uploads are allowed".into()));
                }
                let data = field.bytes().await.map_err(|e| AppError::Validation(format!("Invalid file field: {}", e)))?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation("File exceeds the 10 MiB limit".into()));
                }
                file = Some((file_name, content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) = file.ok_or(AppError::Validation("A file field is required".into()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }

    let asset = media.upload(NewUpload { folder: clean_folder(folder)?, file_name, content_type, data }).await?;
    info!("Asset {} uploaded ({} bytes)", asset.public_id, asset.bytes);
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssetListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let folder = clean_folder(query.folder)?;
    let assets = state.media()?.list(folder.as_deref()).await?;
    Ok(Json(assets))
}

pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let asset = state.media()?.resource(&public_id).await?
        .ok_or(AppError::NotFound("Asset not found".into()))?;
    Ok(Json(asset))
}

pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(public_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.media()?.destroy(&public_id).await?;
    info!("Asset {} deleted", public_id);
    Ok(StatusCode::NO_CONTENT)
}
