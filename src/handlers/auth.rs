// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateIdentityRequest, LoginRequest, MeResponse, User},
    utils::{
        hash::verify_password,
        jwt::{Claims, sign_jwt},
        roles::resolve_role,
    },
};

/// Pre-creates a passwordless identity for one prospective participant.
///
/// The identity starts without a password; the team registration workflow
/// sets it later. Reaching this endpoint implies the email was verified by a
/// one-time code upstream.
pub async fn create_identity(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateIdentityRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (email, display_name)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(&payload.email)
    .bind(&payload.name)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Email '{}' is already registered", payload.email))
        } else {
            tracing::error!("Failed to create identity: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Authenticates a user and returns a JWT token.
///
/// The token carries only the user id; the role is resolved from the
/// database on each authorization decision.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT id, email, password_hash, display_name, metadata, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("User not found".to_string()))?;

    let password_hash = user.password_hash.as_deref().ok_or(AppError::AuthError(
        "Account has not completed registration".to_string(),
    ))?;

    let is_valid = verify_password(&payload.password, password_hash)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;
    let role = resolve_role(&pool, user.id).await;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
    })))
}

/// Returns the current identity with its resolved role.
pub async fn me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();

    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT id, email, password_hash, display_name, metadata, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?;

    let user = user.ok_or(AppError::NotFound("User not found".to_string()))?;
    let role = resolve_role(&pool, user.id).await;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        name: user.display_name,
        role,
    }))
}
