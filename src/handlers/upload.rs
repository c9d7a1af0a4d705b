// src/handlers/upload.rs

use axum::{
    Json,
    extract::{Extension, Multipart, State},
    response::IntoResponse,
};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{config::Config, error::AppError, utils::jwt::Claims};

const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Accepts a profile photo as multipart form data.
///
/// Only jpeg/png/webp up to 5MB are accepted. The file lands in the upload
/// directory (served statically under /uploads) and its public URL is
/// returned.
pub async fn profile_photo(
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut saved: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = match content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unsupported photo type '{}': use jpeg, png or webp",
                    other
                )));
            }
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if data.is_empty() {
            return Err(AppError::BadRequest("Empty file".to_string()));
        }
        if data.len() > MAX_PHOTO_BYTES {
            return Err(AppError::BadRequest("Photo exceeds the 5MB limit".to_string()));
        }

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
            .as_millis();
        let filename = format!("profile-{}-{}.{}", claims.user_id(), stamp, extension);
        let path = std::path::Path::new(&config.upload_dir).join(&filename);

        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        tracing::info!("Stored profile photo {} ({} bytes)", filename, data.len());
        saved = Some(format!("{}/uploads/{}", config.public_base_url, filename));
        break;
    }

    let url = saved.ok_or(AppError::BadRequest(
        "Missing 'photo' field in multipart body".to_string(),
    ))?;

    Ok(Json(serde_json::json!({ "url": url })))
}
