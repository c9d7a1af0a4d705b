// src/analytics.rs
//
// Pure aggregation over attempt/answer rows. Every dashboard load recomputes
// from scratch; nothing here caches or stores derived values.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::scoring::calculate_percentage;

/// The slice of an attempt row the aggregators care about.
#[derive(Debug, Clone, Copy)]
pub struct AttemptStat {
    pub submitted: bool,
    pub score: i64,
    pub started_at: DateTime<Utc>,
}

/// Mean score over submitted attempts, round-half-up. In-progress attempts
/// never enter an average.
pub fn average_score(attempts: &[AttemptStat]) -> i64 {
    let submitted: Vec<i64> = attempts
        .iter()
        .filter(|a| a.submitted)
        .map(|a| a.score)
        .collect();

    if submitted.is_empty() {
        return 0;
    }

    let sum: i64 = submitted.iter().sum();
    (sum as f64 / submitted.len() as f64).round() as i64
}

/// Share of a participant's attempts that reached submission, as a rounded
/// percentage. Zero when there are no attempts at all.
pub fn completion_rate(attempts: &[AttemptStat]) -> i64 {
    if attempts.is_empty() {
        return 0;
    }
    let submitted = attempts.iter().filter(|a| a.submitted).count() as i64;
    calculate_percentage(submitted, attempts.len() as i64)
}

pub const SCORE_BUCKET_LABELS: [&str; 4] = ["0-25", "26-50", "51-75", "76-100"];

#[derive(Debug, Serialize)]
pub struct ScoreBucket {
    pub range: &'static str,
    pub count: i64,
}

/// Places each participant's rounded average score into one of four fixed
/// buckets by ascending threshold comparison.
pub fn score_distribution(participant_averages: &[i64]) -> Vec<ScoreBucket> {
    let mut counts = [0i64; 4];
    for &avg in participant_averages {
        let idx = if avg <= 25 {
            0
        } else if avg <= 50 {
            1
        } else if avg <= 75 {
            2
        } else {
            3
        };
        counts[idx] += 1;
    }

    SCORE_BUCKET_LABELS
        .iter()
        .zip(counts)
        .map(|(range, count)| ScoreBucket { range, count })
        .collect()
}

/// Difficulty band for a question, from the share of attempts that answered
/// it correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DifficultyBand {
    Easy,
    Medium,
    Hard,
    #[serde(rename = "Very Hard")]
    VeryHard,
}

pub fn classify_difficulty(correct_percentage: i64) -> DifficultyBand {
    if correct_percentage >= 76 {
        DifficultyBand::Easy
    } else if correct_percentage >= 51 {
        DifficultyBand::Medium
    } else if correct_percentage >= 26 {
        DifficultyBand::Hard
    } else {
        DifficultyBand::VeryHard
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: i64,
}

/// Attempt counts per calendar day for the 30 days ending at `today`,
/// oldest day first. Each attempt falls in exactly one half-open day
/// interval `[day 00:00, next day 00:00)`.
pub fn attempts_trend(started_at: &[DateTime<Utc>], today: NaiveDate) -> Vec<TrendPoint> {
    let mut points = Vec::with_capacity(30);
    for offset in (0..30).rev() {
        let day = today - Duration::days(offset);
        let count = started_at
            .iter()
            .filter(|ts| ts.date_naive() == day)
            .count() as i64;
        points.push(TrendPoint { date: day, count });
    }
    points
}
