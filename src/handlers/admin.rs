// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, Exam, UpdateExamRequest},
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        team::{Participant, Team},
        user::Profile,
    },
};

/// Lists all exams, newest first.
/// Admin only.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams: Vec<Exam> = sqlx::query_as(
        r#"
        SELECT id, title, status, scheduled_start, scheduled_end,
               duration_minutes, total_questions, passing_score, created_at
        FROM exams
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Creates a new exam. A populated window must be ordered.
/// Admin only.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if let (Some(start), Some(end)) = (payload.scheduled_start, payload.scheduled_end) {
        if start >= end {
            return Err(AppError::BadRequest(
                "scheduledStart must be before scheduledEnd".to_string(),
            ));
        }
    }

    let status = if payload.scheduled_start.is_some() && payload.scheduled_end.is_some() {
        "scheduled"
    } else {
        "draft"
    };

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO exams (title, status, scheduled_start, scheduled_end, duration_minutes, passing_score)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(status)
    .bind(payload.scheduled_start)
    .bind(payload.scheduled_end)
    .bind(payload.duration_minutes)
    .bind(payload.passing_score)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Fetches a single exam by ID.
/// Admin only.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam: Option<Exam> = sqlx::query_as(
        r#"
        SELECT id, title, status, scheduled_start, scheduled_end,
               duration_minutes, total_questions, passing_score, created_at
        FROM exams
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let exam = exam.ok_or(AppError::NotFound("Exam not found".to_string()))?;
    Ok(Json(exam))
}

/// Updates an exam by ID. Only provided fields change.
/// Admin only.
pub async fn update_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none()
        && payload.status.is_none()
        && payload.scheduled_start.is_none()
        && payload.scheduled_end.is_none()
        && payload.duration_minutes.is_none()
        && payload.passing_score.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(status) = &payload.status {
        if !["draft", "scheduled", "active", "completed"].contains(&status.as_str()) {
            return Err(AppError::BadRequest(format!("Invalid status '{}'", status)));
        }
    }

    // Validate the effective post-update row: anything past 'draft' must
    // carry an ordered window. The database CHECK cannot catch the all-NULL
    // case (NULL comparison is unknown, not false).
    let current: Option<(String, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> =
        sqlx::query_as("SELECT status, scheduled_start, scheduled_end FROM exams WHERE id = $1")
            .bind(id)
            .fetch_optional(&pool)
            .await?;
    let (current_status, current_start, current_end) =
        current.ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let effective_status = payload.status.as_deref().unwrap_or(&current_status);
    let effective_start = payload.scheduled_start.or(current_start);
    let effective_end = payload.scheduled_end.or(current_end);

    if effective_status != "draft" {
        match (effective_start, effective_end) {
            (Some(start), Some(end)) if start < end => {}
            _ => {
                return Err(AppError::BadRequest(
                    "A non-draft exam needs scheduledStart before scheduledEnd".to_string(),
                ));
            }
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    if let Some(start) = payload.scheduled_start {
        separated.push("scheduled_start = ");
        separated.push_bind_unseparated(start);
    }

    if let Some(end) = payload.scheduled_end {
        separated.push("scheduled_end = ");
        separated.push_bind_unseparated(end);
    }

    if let Some(duration) = payload.duration_minutes {
        separated.push("duration_minutes = ");
        separated.push_bind_unseparated(duration);
    }

    if let Some(passing) = payload.passing_score {
        separated.push("passing_score = ");
        separated.push_bind_unseparated(passing);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update exam: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an exam by ID. Questions cascade.
/// Admin only.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists an exam's questions in order, answer key included.
/// Admin only.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions: Vec<Question> = sqlx::query_as(
        r#"
        SELECT id, exam_id, question_text, option_a, option_b, option_c, option_d,
               correct_answer, points, difficulty_level, category, tags, order_index
        FROM questions
        WHERE exam_id = $1
        ORDER BY order_index, id
        "#,
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Creates a question under an exam and bumps the exam's question count.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exam: Option<(i64,)> = sqlx::query_as("SELECT id FROM exams WHERE id = $1")
        .bind(exam_id)
        .fetch_optional(&pool)
        .await?;
    if exam.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    let mut tx = pool.begin().await?;

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO questions
        (exam_id, question_text, option_a, option_b, option_c, option_d,
         correct_answer, points, difficulty_level, category, tags, order_index)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(exam_id)
    .bind(&payload.question_text)
    .bind(&payload.option_a)
    .bind(&payload.option_b)
    .bind(&payload.option_c)
    .bind(&payload.option_d)
    .bind(&payload.correct_answer)
    .bind(payload.points)
    .bind(&payload.difficulty_level)
    .bind(&payload.category)
    .bind(&payload.tags)
    .bind(payload.order_index)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    sqlx::query("UPDATE exams SET total_questions = total_questions + 1 WHERE id = $1")
        .bind(exam_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Updates a question by ID. Only provided fields change.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.question_text.is_none()
        && payload.option_a.is_none()
        && payload.option_b.is_none()
        && payload.option_c.is_none()
        && payload.option_d.is_none()
        && payload.correct_answer.is_none()
        && payload.points.is_none()
        && payload.difficulty_level.is_none()
        && payload.category.is_none()
        && payload.tags.is_none()
        && payload.order_index.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(answer) = &payload.correct_answer {
        if crate::scoring::AnswerChoice::parse(answer).is_none() {
            return Err(AppError::BadRequest(
                "correctAnswer must be one of A, B, C, D".to_string(),
            ));
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(text) = payload.question_text {
        separated.push("question_text = ");
        separated.push_bind_unseparated(text);
    }

    if let Some(option_a) = payload.option_a {
        separated.push("option_a = ");
        separated.push_bind_unseparated(option_a);
    }

    if let Some(option_b) = payload.option_b {
        separated.push("option_b = ");
        separated.push_bind_unseparated(option_b);
    }

    if let Some(option_c) = payload.option_c {
        separated.push("option_c = ");
        separated.push_bind_unseparated(option_c);
    }

    if let Some(option_d) = payload.option_d {
        separated.push("option_d = ");
        separated.push_bind_unseparated(option_d);
    }

    if let Some(answer) = payload.correct_answer {
        separated.push("correct_answer = ");
        separated.push_bind_unseparated(answer);
    }

    if let Some(points) = payload.points {
        separated.push("points = ");
        separated.push_bind_unseparated(points);
    }

    if let Some(difficulty) = payload.difficulty_level {
        separated.push("difficulty_level = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(category) = payload.category {
        separated.push("category = ");
        separated.push_bind_unseparated(category);
    }

    if let Some(tags) = payload.tags {
        separated.push("tags = ");
        separated.push_bind_unseparated(tags);
    }

    if let Some(order_index) = payload.order_index {
        separated.push("order_index = ");
        separated.push_bind_unseparated(order_index);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question by ID and decrements its exam's question count.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let exam_id: Option<(i64,)> =
        sqlx::query_as("DELETE FROM questions WHERE id = $1 RETURNING exam_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete question: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    let Some((exam_id,)) = exam_id else {
        return Err(AppError::NotFound("Question not found".to_string()));
    };

    sqlx::query(
        "UPDATE exams SET total_questions = GREATEST(total_questions - 1, 0) WHERE id = $1",
    )
    .bind(exam_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists all registered teams.
/// Admin only.
pub async fn list_teams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let teams: Vec<Team> = sqlx::query_as(
        r#"
        SELECT id, team_name, created_at
        FROM teams
        ORDER BY id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list teams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(teams))
}

/// DTO for changing a user's role.
#[derive(Debug, serde::Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// Promotes or demotes a user by upserting their profile row, which is the
/// authoritative role source. Takes effect on the next request; no re-login
/// needed.
/// Admin only.
pub async fn update_user_role(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !["admin", "participant"].contains(&payload.role.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Invalid role '{}'",
            payload.role
        )));
    }

    let user: Option<(Option<String>,)> =
        sqlx::query_as("SELECT display_name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?;
    let (display_name,) = user.ok_or(AppError::NotFound("User not found".to_string()))?;

    let profile: Profile = sqlx::query_as(
        r#"
        INSERT INTO profiles (user_id, role, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
        RETURNING user_id, role, name, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&payload.role)
    .bind(&display_name)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update role for user {}: {:?}", user_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(profile))
}

/// Lists all registered participants.
/// Admin only.
pub async fn list_participants(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let participants: Vec<Participant> = sqlx::query_as(
        r#"
        SELECT id, user_id, team_id, name, email, phone, school_name, aadhar,
               is_participant1, email_verified, phone_verified
        FROM participants
        ORDER BY id
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list participants: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(participants))
}
