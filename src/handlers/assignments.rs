// src/handlers/assignments.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::exam::{AssignParticipantsRequest, AssignmentRow},
    utils::jwt::Claims,
};

/// Lists participants assigned to an exam.
/// Admin only.
pub async fn list_assignments(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows: Vec<AssignmentRow> = sqlx::query_as(
        r#"
        SELECT ep.participant_id, p.name, p.email, ep.assigned_at, ep.assigned_by
        FROM exam_participants ep
        JOIN participants p ON p.id = ep.participant_id
        WHERE ep.exam_id = $1
        ORDER BY ep.assigned_at
        "#,
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list assignments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(rows))
}

/// Assigns participants to an exam. Idempotent: already-assigned pairs are
/// ignored, never errors.
/// Admin only.
pub async fn assign_participants(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<AssignParticipantsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.participant_ids.is_empty() {
        return Err(AppError::BadRequest(
            "participantIds must not be empty".to_string(),
        ));
    }

    let exam: Option<(i64,)> = sqlx::query_as("SELECT id FROM exams WHERE id = $1")
        .bind(exam_id)
        .fetch_optional(&pool)
        .await?;
    if exam.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let assigned_by = claims.user_id();
    let mut assigned = 0u64;

    for participant_id in &payload.participant_ids {
        let result = sqlx::query(
            r#"
            INSERT INTO exam_participants (exam_id, participant_id, assigned_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (exam_id, participant_id) DO NOTHING
            "#,
        )
        .bind(exam_id)
        .bind(participant_id)
        .bind(assigned_by)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to assign participant {}: {:?}", participant_id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        assigned += result.rows_affected();
    }

    Ok(Json(serde_json::json!({ "assigned": assigned })))
}

/// Unassigns participants from an exam.
/// Admin only.
pub async fn unassign_participants(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<AssignParticipantsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.participant_ids.is_empty() {
        return Err(AppError::BadRequest(
            "participantIds must not be empty".to_string(),
        ));
    }

    let result = sqlx::query(
        "DELETE FROM exam_participants WHERE exam_id = $1 AND participant_id = ANY($2)",
    )
    .bind(exam_id)
    .bind(&payload.participant_ids)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to unassign participants: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "No matching assignments found".to_string(),
        ));
    }

    Ok(StatusCode::NO_CONTENT)
}
