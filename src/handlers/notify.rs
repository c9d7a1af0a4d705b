// src/handlers/notify.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{config::Config, error::AppError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityNotificationRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000))]
    pub message: String,
    /// Overrides the configured authority address when present.
    #[validate(email)]
    pub to: Option<String>,
}

/// Sends a best-effort notification email to the competition authority.
///
/// When the mail provider is not configured the request still succeeds with
/// `skipped: true`. A provider failure is logged and reported, but never
/// becomes a 5xx: email is a side channel, not part of the contract.
pub async fn send_authority_notification(
    State(config): State<Config>,
    Json(payload): Json<AuthorityNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (Some(api_url), Some(api_key), Some(from)) = (
        &config.mail_api_url,
        &config.mail_api_key,
        &config.mail_from,
    ) else {
        tracing::warn!("Mail provider not configured, skipping authority notification");
        return Ok(Json(serde_json::json!({ "skipped": true })));
    };

    let to = payload
        .to
        .as_ref()
        .or(config.authority_email.as_ref())
        .ok_or(AppError::BadRequest(
            "No recipient: set AUTHORITY_EMAIL or pass 'to'".to_string(),
        ))?;

    let body = serde_json::json!({
        "from": from,
        "to": [to],
        "subject": payload.subject,
        "text": payload.message,
    });

    let result = reqwest::Client::new()
        .post(api_url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .and_then(|resp| resp.error_for_status());

    match result {
        Ok(_) => {
            tracing::info!("Authority notification sent to {}", to);
            Ok(Json(serde_json::json!({ "sent": true })))
        }
        Err(e) => {
            tracing::error!("Authority notification failed (non-fatal): {:?}", e);
            Ok(Json(serde_json::json!({ "sent": false })))
        }
    }
}
