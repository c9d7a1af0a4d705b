// src/models/team.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'teams' table. Created once at registration, never mutated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub team_name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'participants' table. Exactly two rows per team,
/// distinguished by `is_participant1`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: i64,
    pub user_id: i64,
    pub team_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub school_name: String,
    pub aadhar: String,
    pub is_participant1: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
}

/// Personal data for one member of a registering team. The identity referenced
/// by `user_id` must already exist (created passwordless at email verification).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetails {
    pub user_id: i64,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 15))]
    pub phone: String,
    #[validate(length(min = 1, max = 200))]
    pub school_name: String,
    #[validate(length(min = 12, max = 12, message = "Aadhar must be 12 digits."))]
    pub aadhar: String,
}

/// DTO for the team registration workflow.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeamRequest {
    #[validate(length(min = 1, max = 100, message = "Team name is required."))]
    pub team_name: String,
    #[validate(nested)]
    pub participant1: ParticipantDetails,
    #[validate(nested)]
    pub participant2: ParticipantDetails,
}

/// Uniform result body for registration.
#[derive(Debug, Serialize)]
pub struct RegistrationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
