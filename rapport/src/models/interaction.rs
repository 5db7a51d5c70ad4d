use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Direction, SentimentLabel};

/// One recorded message between the user and a contact. Written once, never
/// updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub contact_id: String,
    /// Source message id; lookup only.
    pub email_id: Option<String>,
    pub direction: Direction,
    pub subject: String,
    /// Set for outbound interactions.
    pub sent_at: Option<DateTime<Utc>>,
    /// Set for inbound interactions.
    pub received_at: Option<DateTime<Utc>>,
    pub sentiment: Option<f64>,
    pub sentiment_label: Option<SentimentLabel>,
    pub was_response: bool,
    pub response_time_minutes: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Build an interaction with the timestamp placed on the field matching
    /// its direction.
    pub fn new(
        id: String,
        contact_id: String,
        direction: Direction,
        subject: String,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let (sent_at, received_at) = match direction {
            Direction::Outbound => (Some(occurred_at), None),
            Direction::Inbound => (None, Some(occurred_at)),
        };
        Self {
            id,
            contact_id,
            email_id: None,
            direction,
            subject,
            sent_at,
            received_at,
            sentiment: None,
            sentiment_label: None,
            was_response: false,
            response_time_minutes: None,
            created_at: Utc::now(),
        }
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at.or(self.received_at)
    }
}
