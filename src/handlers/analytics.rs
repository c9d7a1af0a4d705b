// src/handlers/analytics.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    analytics::{
        AttemptStat, attempts_trend, average_score, classify_difficulty, completion_rate,
        score_distribution,
    },
    error::AppError,
    scoring::calculate_percentage,
};

#[derive(Debug, sqlx::FromRow)]
struct AttemptRow {
    participant_id: i64,
    status: String,
    score: i32,
    started_at: DateTime<Utc>,
}

impl AttemptRow {
    fn stat(&self) -> AttemptStat {
        AttemptStat {
            submitted: self.status == "submitted",
            score: self.score as i64,
            started_at: self.started_at,
        }
    }
}

/// Overall dashboard counters. The four counts and the attempt rows are
/// independent, so they are fetched concurrently.
/// Admin only.
pub async fn stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let total_exams = count(&pool, "SELECT COUNT(*) FROM exams");
    let total_participants = count(&pool, "SELECT COUNT(*) FROM participants");
    let total_teams = count(&pool, "SELECT COUNT(*) FROM teams");
    let total_attempts = count(&pool, "SELECT COUNT(*) FROM exam_attempts");
    let attempts = fetch_attempts(&pool, None);

    let (total_exams, total_participants, total_teams, total_attempts, attempts) = tokio::try_join!(
        total_exams,
        total_participants,
        total_teams,
        total_attempts,
        attempts
    )?;

    let stats: Vec<AttemptStat> = attempts.iter().map(AttemptRow::stat).collect();

    Ok(Json(serde_json::json!({
        "totalExams": total_exams,
        "totalParticipants": total_participants,
        "totalTeams": total_teams,
        "totalAttempts": total_attempts,
        "averageScore": average_score(&stats),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAnalyticsQuery {
    pub exam_id: i64,
}

/// Attempt counters and average score scoped to one exam.
/// Admin only.
pub async fn exam_analytics(
    State(pool): State<PgPool>,
    Query(query): Query<ExamAnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = fetch_attempts(&pool, Some(query.exam_id)).await?;
    let stats: Vec<AttemptStat> = attempts.iter().map(AttemptRow::stat).collect();
    let submitted = stats.iter().filter(|a| a.submitted).count();

    Ok(Json(serde_json::json!({
        "totalAttempts": stats.len(),
        "submittedAttempts": submitted,
        "averageScore": average_score(&stats),
    })))
}

/// Every attempting participant's rounded average score, one entry each.
/// A participant with no submitted attempts averages 0 and still lands in
/// the lowest bucket.
fn participant_averages(attempts: &[AttemptRow]) -> Vec<i64> {
    let mut per_participant: HashMap<i64, Vec<AttemptStat>> = HashMap::new();
    for row in attempts {
        per_participant
            .entry(row.participant_id)
            .or_default()
            .push(row.stat());
    }

    per_participant
        .values()
        .map(|stats| average_score(stats))
        .collect()
}

/// Buckets each participant's rounded average score into the four fixed
/// score ranges.
/// Admin only.
pub async fn distribution(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let attempts = fetch_attempts(&pool, None).await?;

    Ok(Json(score_distribution(&participant_averages(&attempts))))
}

/// Per-participant average score and completion rate, both computed on read.
/// Admin only.
pub async fn participant_performance(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = fetch_attempts(&pool, None).await?;

    let mut per_participant: HashMap<i64, Vec<AttemptStat>> = HashMap::new();
    for row in &attempts {
        per_participant
            .entry(row.participant_id)
            .or_default()
            .push(row.stat());
    }

    let mut report: Vec<serde_json::Value> = per_participant
        .into_iter()
        .map(|(participant_id, stats)| {
            serde_json::json!({
                "participantId": participant_id,
                "averageScore": average_score(&stats),
                "completionRate": completion_rate(&stats),
                "totalAttempts": stats.len(),
            })
        })
        .collect();

    report.sort_by_key(|entry| entry["participantId"].as_i64());

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyQuery {
    pub exam_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct AnswerRow {
    question_id: i64,
    question_text: String,
    is_correct: bool,
}

/// Per-question difficulty from the share of correct answers.
/// Admin only.
pub async fn question_difficulty(
    State(pool): State<PgPool>,
    Query(query): Query<DifficultyQuery>,
) -> Result<impl IntoResponse, AppError> {
    let answers: Vec<AnswerRow> = sqlx::query_as(
        r#"
        SELECT a.question_id, q.question_text, a.is_correct
        FROM exam_answers a
        JOIN questions q ON q.id = a.question_id
        WHERE ($1::BIGINT IS NULL OR q.exam_id = $1)
        "#,
    )
    .bind(query.exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch answers for difficulty: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // question id -> (text, correct, total)
    let mut tallies: HashMap<i64, (String, i64, i64)> = HashMap::new();
    for row in answers {
        let entry = tallies
            .entry(row.question_id)
            .or_insert_with(|| (row.question_text.clone(), 0, 0));
        if row.is_correct {
            entry.1 += 1;
        }
        entry.2 += 1;
    }

    let mut report: Vec<serde_json::Value> = tallies
        .into_iter()
        .map(|(question_id, (question_text, correct, total))| {
            let percentage = calculate_percentage(correct, total);
            serde_json::json!({
                "questionId": question_id,
                "questionText": question_text,
                "correctCount": correct,
                "totalAttempts": total,
                "correctPercentage": percentage,
                "difficulty": classify_difficulty(percentage),
            })
        })
        .collect();

    report.sort_by_key(|entry| entry["questionId"].as_i64());

    Ok(Json(report))
}

/// Attempt counts per day for the last 30 calendar days, oldest first.
/// Admin only.
pub async fn trends(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let window_start = today - Duration::days(29);

    let stamps: Vec<(DateTime<Utc>,)> = sqlx::query_as(
        "SELECT started_at FROM exam_attempts WHERE started_at >= $1",
    )
    .bind(
        window_start
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now),
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempt trend: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let stamps: Vec<DateTime<Utc>> = stamps.into_iter().map(|(ts,)| ts).collect();

    Ok(Json(attempts_trend(&stamps, today)))
}

async fn count(pool: &PgPool, sql: &str) -> Result<i64, AppError> {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
    Ok(n)
}

async fn fetch_attempts(pool: &PgPool, exam_id: Option<i64>) -> Result<Vec<AttemptRow>, AppError> {
    let rows: Vec<AttemptRow> = sqlx::query_as(
        r#"
        SELECT participant_id, status, score, started_at
        FROM exam_attempts
        WHERE ($1::BIGINT IS NULL OR exam_id = $1)
        "#,
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attempt(participant_id: i64, status: &str, score: i32) -> AttemptRow {
        AttemptRow {
            participant_id,
            status: status.to_string(),
            score,
            started_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn participant_with_only_open_attempts_averages_zero() {
        let attempts = vec![
            attempt(1, "submitted", 80),
            attempt(1, "submitted", 60),
            attempt(2, "in_progress", 0),
        ];

        let mut averages = participant_averages(&attempts);
        averages.sort();
        // Participant 2 has nothing submitted yet: their average is 0 and
        // they still occupy the lowest bucket, not vanish from the chart.
        assert_eq!(averages, vec![0, 70]);

        let buckets = score_distribution(&averages);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[2].count, 1);
    }

    #[test]
    fn averages_are_per_participant_not_per_attempt() {
        let attempts = vec![
            attempt(1, "submitted", 100),
            attempt(1, "submitted", 0),
            attempt(2, "submitted", 50),
        ];

        let mut averages = participant_averages(&attempts);
        averages.sort();
        assert_eq!(averages, vec![50, 50]);
    }
}
