// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'questions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub exam_id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// One of 'A', 'B', 'C', 'D'.
    pub correct_answer: String,

    pub points: i32,
    pub difficulty_level: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub order_index: i32,
}

/// DTO for sending a question to an exam taker (excludes the answer key).
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub points: i32,
    pub order_index: i32,
}

/// DTO for creating a new question under an exam.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500))]
    pub option_d: String,
    #[validate(custom(function = validate_answer_key))]
    pub correct_answer: String,
    #[validate(range(min = 1, max = 100))]
    pub points: i32,
    pub difficulty_level: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order_index: i32,
}

fn validate_answer_key(answer: &str) -> Result<(), validator::ValidationError> {
    if crate::scoring::AnswerChoice::parse(answer).is_none() {
        return Err(validator::ValidationError::new("answer_must_be_a_to_d"));
    }
    Ok(())
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub question_text: Option<String>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: Option<String>,
    pub points: Option<i32>,
    pub difficulty_level: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub order_index: Option<i32>,
}

/// Represents the 'question_sets' table: a reusable, exam-independent
/// bundle of questions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub total_questions: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a question set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionSetRequest {
    pub name: String,
    pub description: Option<String>,
    pub question_ids: Vec<i64>,
}
