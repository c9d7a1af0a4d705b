// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table: an authentication identity.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2 hash. NULL for identities that have not completed registration.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: Option<String>,

    pub display_name: Option<String>,

    /// Legacy metadata bag. Older accounts may carry a 'role' key here.
    pub metadata: sqlx::types::Json<serde_json::Value>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'profiles' table: the authoritative role record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: i64,
    pub role: String,
    pub name: Option<String>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for pre-creating a passwordless identity before team registration.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIdentityRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Aggregated identity data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: crate::utils::roles::Role,
}
