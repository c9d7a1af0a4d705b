// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// Represents the 'exam_attempts' table. Created when a participant starts
/// an exam; flipped to 'submitted' with its final score; never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamAttempt {
    pub id: i64,
    pub exam_id: i64,
    pub participant_id: i64,

    /// 'in_progress' or 'submitted'.
    pub status: String,

    pub score: i32,
    pub time_taken_minutes: Option<i32>,
    pub started_at: DateTime<Utc>,
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    /// Question ID -> selected option ('A'..'D').
    pub answers: HashMap<i64, String>,
    pub time_taken_minutes: Option<i32>,
}

/// Result body returned after grading a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub attempt_id: i64,
    pub score: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub percentage: i64,
    pub passed: bool,
}
