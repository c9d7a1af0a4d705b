// src/handlers/attempts.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptResult, ExamAttempt, SubmitAttemptRequest},
        exam::Exam,
        question::PublicQuestion,
    },
    scoring::{AnswerChoice, GradedAnswer, calculate_percentage, calculate_total_score, is_passed},
    utils::jwt::Claims,
};

#[derive(Debug, sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    correct_answer: String,
    points: i32,
}

/// Lists the exams assigned to the calling participant.
pub async fn list_my_exams(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = participant_id_for(&pool, claims.user_id()).await?;

    let exams: Vec<Exam> = sqlx::query_as(
        r#"
        SELECT e.id, e.title, e.status, e.scheduled_start, e.scheduled_end,
               e.duration_minutes, e.total_questions, e.passing_score, e.created_at
        FROM exams e
        JOIN exam_participants ep ON ep.exam_id = e.id
        WHERE ep.participant_id = $1
        ORDER BY e.scheduled_start NULLS LAST, e.id
        "#,
    )
    .bind(participant_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list assigned exams: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Returns an exam's questions without the answer key. Requires an
/// assignment and an open attempt.
pub async fn exam_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = participant_id_for(&pool, claims.user_id()).await?;
    require_assignment(&pool, exam_id, participant_id).await?;

    let questions: Vec<PublicQuestion> = sqlx::query_as(
        r#"
        SELECT id, question_text, option_a, option_b, option_c, option_d, points, order_index
        FROM questions
        WHERE exam_id = $1
        ORDER BY order_index, id
        "#,
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch exam questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Starts an attempt. Each participant gets exactly one attempt per exam;
/// starting twice is a conflict.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = participant_id_for(&pool, claims.user_id()).await?;
    require_assignment(&pool, exam_id, participant_id).await?;

    let exam: Option<(String,)> = sqlx::query_as("SELECT status FROM exams WHERE id = $1")
        .bind(exam_id)
        .fetch_optional(&pool)
        .await?;

    let (status,) = exam.ok_or(AppError::NotFound("Exam not found".to_string()))?;
    if status != "active" {
        return Err(AppError::BadRequest(format!(
            "Exam is not active (status: {})",
            status
        )));
    }

    let attempt: Result<ExamAttempt, sqlx::Error> = sqlx::query_as(
        r#"
        INSERT INTO exam_attempts (exam_id, participant_id)
        VALUES ($1, $2)
        RETURNING id, exam_id, participant_id, status, score, time_taken_minutes, started_at
        "#,
    )
    .bind(exam_id)
    .bind(participant_id)
    .fetch_one(&pool)
    .await;

    let attempt = attempt.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("An attempt for this exam already exists".to_string())
        } else {
            tracing::error!("Failed to start attempt: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Grades and submits the calling participant's open attempt.
///
/// Per-question answers are persisted, the attempt flips to 'submitted'
/// with its final score, and the graded summary is returned.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let participant_id = participant_id_for(&pool, claims.user_id()).await?;

    let attempt: Option<ExamAttempt> = sqlx::query_as(
        r#"
        SELECT id, exam_id, participant_id, status, score, time_taken_minutes, started_at
        FROM exam_attempts
        WHERE exam_id = $1 AND participant_id = $2
        "#,
    )
    .bind(exam_id)
    .bind(participant_id)
    .fetch_optional(&pool)
    .await?;

    let attempt = attempt.ok_or(AppError::NotFound("No attempt found for this exam".to_string()))?;
    if attempt.status == "submitted" {
        return Err(AppError::Conflict("Attempt was already submitted".to_string()));
    }

    let keys: Vec<AnswerKey> = sqlx::query_as(
        "SELECT id, correct_answer, points FROM questions WHERE exam_id = $1",
    )
    .bind(exam_id)
    .fetch_all(&pool)
    .await?;

    let passing_score: Option<(Option<i32>,)> =
        sqlx::query_as("SELECT passing_score FROM exams WHERE id = $1")
            .bind(exam_id)
            .fetch_optional(&pool)
            .await?;
    let passing_score = passing_score.and_then(|(p,)| p).map(i64::from);

    // Grade only questions that belong to this exam; unknown ids are ignored.
    let mut graded = Vec::new();
    let mut stored = Vec::new();
    let mut total_possible = 0i64;

    for key in &keys {
        total_possible += key.points as i64;

        let correct = AnswerChoice::parse(&key.correct_answer).ok_or_else(|| {
            AppError::InternalServerError(format!("Corrupt answer key on question {}", key.id))
        })?;

        if let Some(raw) = payload.answers.get(&key.id) {
            let selected = AnswerChoice::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid answer '{}' for question {}", raw, key.id))
            })?;
            graded.push(GradedAnswer {
                selected,
                correct,
                points: key.points as i64,
            });
            stored.push((key.id, selected, selected == correct));
        }
    }

    let summary = calculate_total_score(&graded);
    let percentage = calculate_percentage(summary.total_score, total_possible);
    let passed = is_passed(summary.total_score, passing_score);

    let mut tx = pool.begin().await?;

    for (question_id, selected, is_correct) in &stored {
        sqlx::query(
            r#"
            INSERT INTO exam_answers (attempt_id, question_id, selected_answer, is_correct)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(attempt.id)
        .bind(question_id)
        .bind(selected.as_str())
        .bind(is_correct)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        UPDATE exam_attempts
        SET status = 'submitted', score = $1, time_taken_minutes = $2
        WHERE id = $3
        "#,
    )
    .bind(summary.total_score as i32)
    .bind(payload.time_taken_minutes)
    .bind(attempt.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "Attempt {} submitted: {}/{} points",
        attempt.id,
        summary.total_score,
        total_possible
    );

    Ok(Json(AttemptResult {
        attempt_id: attempt.id,
        score: summary.total_score,
        correct_answers: summary.correct_answers,
        total_questions: summary.total_questions,
        percentage,
        passed,
    }))
}

/// Returns the calling participant's attempt on an exam.
pub async fn my_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let participant_id = participant_id_for(&pool, claims.user_id()).await?;

    let attempt: Option<ExamAttempt> = sqlx::query_as(
        r#"
        SELECT id, exam_id, participant_id, status, score, time_taken_minutes, started_at
        FROM exam_attempts
        WHERE exam_id = $1 AND participant_id = $2
        "#,
    )
    .bind(exam_id)
    .bind(participant_id)
    .fetch_optional(&pool)
    .await?;

    let attempt = attempt.ok_or(AppError::NotFound("No attempt found for this exam".to_string()))?;
    Ok(Json(attempt))
}

async fn participant_id_for(pool: &PgPool, user_id: i64) -> Result<i64, AppError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM participants WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.map(|(id,)| id).ok_or(AppError::Forbidden(
        "No participant record for this account".to_string(),
    ))
}

async fn require_assignment(
    pool: &PgPool,
    exam_id: i64,
    participant_id: i64,
) -> Result<(), AppError> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT participant_id FROM exam_participants WHERE exam_id = $1 AND participant_id = $2",
    )
    .bind(exam_id)
    .bind(participant_id)
    .fetch_optional(pool)
    .await?;

    if row.is_none() {
        return Err(AppError::Forbidden(
            "You are not assigned to this exam".to_string(),
        ));
    }
    Ok(())
}
