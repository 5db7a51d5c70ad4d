//! Relationship health score.
//!
//! Five components add up to a 0-100 score:
//!
//! | component  | max | driven by                                 |
//! |------------|-----|-------------------------------------------|
//! | recency    | 30  | days since the last interaction           |
//! | response   | 25  | share of the conversation the contact owns |
//! | initiation | 20  | share of the conversation the user owns    |
//! | sentiment  | 15  | mean interaction sentiment                 |
//! | commitment | 10  | commitments kept / commitments made        |
//!
//! Everything here is pure: the caller supplies `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_RECENCY: f64 = 30.0;
pub const MAX_RESPONSE: f64 = 25.0;
pub const MAX_INITIATION: f64 = 20.0;
pub const MAX_SENTIMENT: f64 = 15.0;
pub const MAX_COMMITMENT: f64 = 10.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Inputs to the health score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthInput {
    pub last_contact_at: Option<DateTime<Utc>>,
    /// Carried for reporting; the response component is balance-based.
    pub avg_response_time_minutes: Option<f64>,
    pub emails_sent: u32,
    pub emails_received: u32,
    pub avg_sentiment: f64,
    pub commitments_made: u32,
    pub commitments_kept: u32,
}

/// Component scores plus their rounded, clamped total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub recency: f64,
    pub response: f64,
    pub initiation: f64,
    pub sentiment: f64,
    pub commitment: f64,
    pub total: i32,
}

/// Fractional days elapsed between `last_contact_at` and `now`. Future
/// timestamps count as zero days.
pub fn days_since(last_contact_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - last_contact_at).num_milliseconds() as f64;
    (millis / MILLIS_PER_DAY).max(0.0)
}

pub fn recency_score(last_contact_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last) = last_contact_at else {
        return 0.0;
    };
    recency_score_for_days(days_since(last, now))
}

pub fn recency_score_for_days(days: f64) -> f64 {
    if !days.is_finite() {
        return 0.0;
    }
    match days {
        d if d <= 1.0 => 30.0,
        d if d <= 7.0 => 25.0,
        d if d <= 14.0 => 20.0,
        d if d <= 30.0 => 15.0,
        d if d <= 60.0 => 10.0,
        d if d <= 90.0 => 5.0,
        _ => 0.0,
    }
}

/// Scores how evenly the contact carries their half of the conversation.
pub fn response_score(emails_sent: u32, emails_received: u32) -> f64 {
    let Some(ratio) = share(emails_received, emails_sent) else {
        return 0.0;
    };
    balance_bucket(ratio, 25.0, 20.0, 10.0)
}

/// Scores how evenly the user starts conversations with the contact.
pub fn initiation_score(emails_sent: u32, emails_received: u32) -> f64 {
    let Some(ratio) = share(emails_sent, emails_received) else {
        return 0.0;
    };
    balance_bucket(ratio, 20.0, 15.0, 10.0)
}

pub fn sentiment_score(avg_sentiment: f64) -> f64 {
    let avg = if avg_sentiment.is_finite() {
        avg_sentiment.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    (avg + 1.0) / 2.0 * MAX_SENTIMENT
}

pub fn commitment_score(commitments_made: u32, commitments_kept: u32) -> f64 {
    if commitments_made == 0 {
        return 0.0;
    }
    let kept = commitments_kept.min(commitments_made);
    kept as f64 / commitments_made as f64 * MAX_COMMITMENT
}

/// `part / (part + other)`, or `None` when there is nothing to divide.
fn share(part: u32, other: u32) -> Option<f64> {
    let total = part as u64 + other as u64;
    if total == 0 {
        return None;
    }
    Some(part as f64 / total as f64)
}

fn balance_bucket(ratio: f64, even: f64, near: f64, lopsided: f64) -> f64 {
    if (0.3..=0.7).contains(&ratio) {
        even
    } else if (0.2..=0.8).contains(&ratio) {
        near
    } else {
        lopsided
    }
}

/// Compute every component and the total score for `input` as of `now`.
pub fn calculate_health(input: &HealthInput, now: DateTime<Utc>) -> HealthBreakdown {
    let recency = recency_score(input.last_contact_at, now);
    let response = response_score(input.emails_sent, input.emails_received);
    let initiation = initiation_score(input.emails_sent, input.emails_received);
    let sentiment = sentiment_score(input.avg_sentiment);
    let commitment = commitment_score(input.commitments_made, input.commitments_kept);

    let sum = recency + response + initiation + sentiment + commitment;
    let total = sum.round().clamp(0.0, 100.0) as i32;

    HealthBreakdown {
        recency,
        response,
        initiation,
        sentiment,
        commitment,
        total,
    }
}

/// The 0-100 health score for `input` as of `now`.
pub fn calculate_health_score(input: &HealthInput, now: DateTime<Utc>) -> i32 {
    calculate_health(input, now).total
}
