// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exams' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    pub title: String,

    /// One of 'draft', 'scheduled', 'active', 'completed'.
    pub status: String,

    /// Scheduling window. Both NULL for unscheduled drafts; ordered
    /// (start < end) for anything scheduled or later.
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,

    pub duration_minutes: i32,
    pub total_questions: i32,

    /// Minimum score to pass. NULL means the exam cannot be failed.
    pub passing_score: Option<i32>,

    pub created_at: Option<DateTime<Utc>>,
}

/// DTO for creating an exam.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required."))]
    pub title: String,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: i32,
    pub passing_score: Option<i32>,
}

/// DTO for partially updating an exam.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExamRequest {
    pub title: Option<String>,
    pub status: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub passing_score: Option<i32>,
}

/// DTO for the schedule conflict check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckRequest {
    /// Exam being edited; excluded from its own conflict check.
    pub exam_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// DTO for assigning participants to an exam.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignParticipantsRequest {
    pub participant_ids: Vec<i64>,
}

/// One participant-to-exam assignment with joined participant info.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRow {
    pub participant_id: i64,
    pub name: String,
    pub email: String,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<i64>,
}
