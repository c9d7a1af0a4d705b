// src/scoring.rs

use serde::{Deserialize, Serialize};

/// One of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerChoice {
    A,
    B,
    C,
    D,
}

impl AnswerChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerChoice::A => "A",
            AnswerChoice::B => "B",
            AnswerChoice::C => "C",
            AnswerChoice::D => "D",
        }
    }

    pub fn parse(value: &str) -> Option<AnswerChoice> {
        match value {
            "A" => Some(AnswerChoice::A),
            "B" => Some(AnswerChoice::B),
            "C" => Some(AnswerChoice::C),
            "D" => Some(AnswerChoice::D),
            _ => None,
        }
    }
}

/// One graded answer: what was picked, what was right, what it was worth.
#[derive(Debug, Clone, Copy)]
pub struct GradedAnswer {
    pub selected: AnswerChoice,
    pub correct: AnswerChoice,
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub total_score: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
}

/// Sums earned points over a set of answers. An answer earns its full point
/// value on an exact match and nothing otherwise.
pub fn calculate_total_score(answers: &[GradedAnswer]) -> ScoreSummary {
    let mut total_score = 0;
    let mut correct_answers = 0;

    for answer in answers {
        if answer.selected == answer.correct {
            total_score += answer.points;
            correct_answers += 1;
        }
    }

    ScoreSummary {
        total_score,
        correct_answers,
        total_questions: answers.len() as i64,
    }
}

/// Score as a whole-number percentage, round-half-up. Zero when there is
/// nothing to score out of.
pub fn calculate_percentage(score: i64, total_possible: i64) -> i64 {
    if total_possible == 0 {
        return 0;
    }
    (score as f64 / total_possible as f64 * 100.0).round() as i64
}

/// A missing passing score means the exam cannot be failed.
pub fn is_passed(score: i64, passing_score: Option<i64>) -> bool {
    match passing_score {
        Some(min) => score >= min,
        None => true,
    }
}
