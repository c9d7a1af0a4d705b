// src/handlers/schedule.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{error::AppError, models::exam::ConflictCheckRequest, models::exam::Exam};

/// Inclusive-interval overlap: two windows conflict iff `s1 <= e2 && s2 <= e1`.
/// Touching boundaries (one window ends exactly when the other starts) DO
/// conflict. This is the single overlap definition for the whole service.
pub fn windows_overlap(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> bool {
    s1 <= e2 && s2 <= e1
}

/// Returns every other exam whose window overlaps the candidate window.
/// Exams without a populated window never conflict; the exam being edited
/// is excluded from its own check.
/// Admin only.
pub async fn check_conflicts(
    State(pool): State<PgPool>,
    Json(payload): Json<ConflictCheckRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.start_time > payload.end_time {
        return Err(AppError::BadRequest(
            "startTime must not be after endTime".to_string(),
        ));
    }

    // The SQL filter uses the same inclusive predicate as windows_overlap;
    // the two must never drift apart.
    let conflicts: Vec<Exam> = sqlx::query_as(
        r#"
        SELECT id, title, status, scheduled_start, scheduled_end,
               duration_minutes, total_questions, passing_score, created_at
        FROM exams
        WHERE scheduled_start IS NOT NULL
          AND scheduled_end IS NOT NULL
          AND scheduled_start <= $1
          AND scheduled_end >= $2
          AND ($3::BIGINT IS NULL OR id <> $3)
        ORDER BY scheduled_start
        "#,
    )
    .bind(payload.end_time)
    .bind(payload.start_time)
    .bind(payload.exam_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to check schedule conflicts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "hasConflicts": !conflicts.is_empty(),
        "conflicts": conflicts,
    })))
}

/// Serves all scheduled exams with populated windows as an iCalendar feed.
/// Admin only.
pub async fn calendar_feed(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams: Vec<Exam> = sqlx::query_as(
        r#"
        SELECT id, title, status, scheduled_start, scheduled_end,
               duration_minutes, total_questions, passing_score, created_at
        FROM exams
        WHERE status <> 'draft'
          AND scheduled_start IS NOT NULL
          AND scheduled_end IS NOT NULL
        ORDER BY scheduled_start
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch exams for calendar feed: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let body = build_calendar(&exams);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "text/calendar; charset=utf-8".parse().unwrap(),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"exam-schedule.ics\"".parse().unwrap(),
    );

    Ok((headers, body))
}

fn build_calendar(exams: &[Exam]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//quizclash//exam-schedule//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for exam in exams {
        // Filtered above; guard anyway so a bad row cannot poison the feed.
        let (Some(start), Some(end)) = (exam.scheduled_start, exam.scheduled_end) else {
            continue;
        };

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:exam-{}@quizclash", exam.id));
        lines.push(format!("DTSTAMP:{}", format_ics(Utc::now())));
        lines.push(format!("DTSTART:{}", format_ics(start)));
        lines.push(format!("DTEND:{}", format_ics(end)));
        lines.push(format!("SUMMARY:{}", escape_ics(&exam.title)));
        lines.push(format!("STATUS:{}", ics_status(&exam.status)));
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());
    // RFC 5545 mandates CRLF line endings.
    lines.join("\r\n") + "\r\n"
}

fn format_ics(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

fn ics_status(exam_status: &str) -> &'static str {
    match exam_status {
        "completed" => "CONFIRMED",
        "active" | "scheduled" => "CONFIRMED",
        _ => "TENTATIVE",
    }
}

fn escape_ics(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
