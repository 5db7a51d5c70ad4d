use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SentimentTrend;

/// A counterpart email address tracked for one user.
///
/// Everything below `display_name` is derived from the contact's interaction
/// history and rewritten on every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub user_id: String,
    /// Lower-cased address, unique per user.
    pub email: String,
    pub display_name: Option<String>,
    pub health_score: i32,
    pub emails_sent: i32,
    pub emails_received: i32,
    pub total_emails: i32,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub recency_score: f64,
    pub response_score: f64,
    pub initiation_score: f64,
    pub sentiment_score: f64,
    pub commitment_score: f64,
    pub avg_sentiment: f64,
    pub avg_response_time_minutes: Option<f64>,
    pub commitments_made: i32,
    pub commitments_kept: i32,
    pub sentiment_trend: SentimentTrend,
    pub suggested_action: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(id: String, user_id: String, email: &str, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            email: email.trim().to_lowercase(),
            display_name,
            health_score: 0,
            emails_sent: 0,
            emails_received: 0,
            total_emails: 0,
            last_contact_at: None,
            recency_score: 0.0,
            response_score: 0.0,
            initiation_score: 0.0,
            sentiment_score: 0.0,
            commitment_score: 0.0,
            avg_sentiment: 0.0,
            avg_response_time_minutes: None,
            commitments_made: 0,
            commitments_kept: 0,
            sentiment_trend: SentimentTrend::Stable,
            suggested_action: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-user rollup over all tracked contacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactStats {
    pub total_contacts: u64,
    pub average_health_score: f64,
    /// Score of 75 or above.
    pub thriving: u64,
    /// Score between 50 and 74.
    pub stable: u64,
    /// Score below 50.
    pub needs_attention: u64,
}
