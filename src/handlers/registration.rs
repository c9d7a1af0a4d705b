// src/handlers/registration.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    models::team::{ParticipantDetails, RegisterTeamRequest, RegistrationResult},
    utils::hash::hash_password,
};

/// Team registration workflow.
///
/// Sets passwords on the two pre-created identities, then creates the team
/// and both participant rows inside one transaction. A duplicate team name
/// or any failed insert rolls everything back; no orphaned team can remain.
pub async fn register_team(
    State(pool): State<PgPool>,
    Json(payload): Json<RegisterTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Steps 1-2: activate both identities. These mutate pre-existing rows
    // and are safe to retry, so they stay outside the transaction.
    if let Err(e) = set_credentials(&pool, &payload.participant1).await {
        return Ok(Json(RegistrationResult {
            success: false,
            error: Some(format!("Participant 1 Error: {}", e)),
        }));
    }

    if let Err(e) = set_credentials(&pool, &payload.participant2).await {
        return Ok(Json(RegistrationResult {
            success: false,
            error: Some(format!("Participant 2 Error: {}", e)),
        }));
    }

    // Steps 3-5: uniqueness check, team insert, both participant inserts.
    let mut tx = pool.begin().await?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM teams WHERE team_name = $1")
        .bind(&payload.team_name)
        .fetch_optional(&mut *tx)
        .await?;

    if existing.is_some() {
        tx.rollback().await?;
        return Ok(Json(RegistrationResult {
            success: false,
            error: Some("Team name already exists.".to_string()),
        }));
    }

    let team_id: Result<(i64,), sqlx::Error> =
        sqlx::query_as("INSERT INTO teams (team_name) VALUES ($1) RETURNING id")
            .bind(&payload.team_name)
            .fetch_one(&mut *tx)
            .await;

    let (team_id,) = match team_id {
        Ok(row) => row,
        Err(e) => {
            tracing::error!("Failed to create team: {:?}", e);
            tx.rollback().await.ok();
            return Ok(Json(RegistrationResult {
                success: false,
                error: Some(e.to_string()),
            }));
        }
    };

    if let Err(e) = insert_participant(&mut tx, team_id, &payload.participant1, true).await {
        tx.rollback().await.ok();
        return Ok(Json(RegistrationResult {
            success: false,
            error: Some(format!("Failed to create participant record: {}", e)),
        }));
    }

    if let Err(e) = insert_participant(&mut tx, team_id, &payload.participant2, false).await {
        tx.rollback().await.ok();
        return Ok(Json(RegistrationResult {
            success: false,
            error: Some(format!("Failed to create participant record: {}", e)),
        }));
    }

    tx.commit().await?;

    tracing::info!("Registered team '{}' (id {})", payload.team_name, team_id);

    Ok(Json(RegistrationResult {
        success: true,
        error: None,
    }))
}

/// Sets password and display name on a pre-created identity, and upserts its
/// participant profile row.
async fn set_credentials(pool: &PgPool, details: &ParticipantDetails) -> Result<(), AppError> {
    let hashed = hash_password(&details.password)?;

    let result = sqlx::query("UPDATE users SET password_hash = $1, display_name = $2 WHERE id = $3")
        .bind(&hashed)
        .bind(&details.name)
        .bind(details.user_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Identity {} not found",
            details.user_id
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, role, name)
        VALUES ($1, 'participant', $2)
        ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()
        "#,
    )
    .bind(details.user_id)
    .bind(&details.name)
    .execute(pool)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(())
}

async fn insert_participant(
    tx: &mut Transaction<'_, Postgres>,
    team_id: i64,
    details: &ParticipantDetails,
    is_participant1: bool,
) -> Result<(), sqlx::Error> {
    // Email was verified by a one-time code before the identity was created;
    // phone verification is not part of the flow yet.
    sqlx::query(
        r#"
        INSERT INTO participants
        (user_id, team_id, name, email, phone, school_name, aadhar,
         is_participant1, email_verified, phone_verified)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, FALSE)
        "#,
    )
    .bind(details.user_id)
    .bind(team_id)
    .bind(&details.name)
    .bind(&details.email)
    .bind(&details.phone)
    .bind(&details.school_name)
    .bind(&details.aadhar)
    .bind(is_participant1)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
