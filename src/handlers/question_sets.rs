// src/handlers/question_sets.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::question::{CreateQuestionSetRequest, QuestionSet},
};

/// Lists all question sets, newest first.
/// Admin only.
pub async fn list_question_sets(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let sets: Vec<QuestionSet> = sqlx::query_as(
        r#"
        SELECT id, name, description, total_questions, created_at
        FROM question_sets
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list question sets: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(sets))
}

/// Creates a question set and its join rows.
///
/// If any join row fails after the set row was created, the set is deleted
/// again so no half-built set remains.
/// Admin only.
pub async fn create_question_set(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionSetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Set name is required.".to_string()));
    }
    if payload.question_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one question is required.".to_string(),
        ));
    }

    let (set_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO question_sets (name, description, total_questions)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.question_ids.len() as i32)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question set: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for (order_index, question_id) in payload.question_ids.iter().enumerate() {
        let result = sqlx::query(
            r#"
            INSERT INTO question_set_questions (set_id, question_id, order_index)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(set_id)
        .bind(question_id)
        .bind(order_index as i32)
        .execute(&pool)
        .await;

        if let Err(e) = result {
            tracing::error!(
                "Failed to attach question {} to set {}, rolling the set back: {:?}",
                question_id,
                set_id,
                e
            );
            sqlx::query("DELETE FROM question_sets WHERE id = $1")
                .bind(set_id)
                .execute(&pool)
                .await
                .ok();
            return Err(AppError::InternalServerError(e.to_string()));
        }
    }

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": set_id }))))
}
