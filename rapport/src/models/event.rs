use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Direction;

/// A message that was just sent or received by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    pub email_id: Option<String>,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    /// `None` when the producer did not say; such events track nothing.
    pub direction: Option<Direction>,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
}

impl MessageEvent {
    /// The header holding the counterpart addresses for this direction.
    pub fn counterpart_field(&self) -> Option<&str> {
        match self.direction? {
            Direction::Outbound => Some(&self.to),
            Direction::Inbound => Some(&self.from),
        }
    }

    /// Timestamp of the event, preferring the field matching the direction.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        match self.direction? {
            Direction::Outbound => self.sent_at.or(self.received_at),
            Direction::Inbound => self.received_at.or(self.sent_at),
        }
    }

    /// Text fed to the sentiment estimator.
    pub fn sentiment_text(&self) -> String {
        format!("{} {}", self.subject, self.body)
    }
}

/// Outcome of tracking one contact from an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResult {
    pub contact_email: String,
    pub success: bool,
    pub health_score: Option<i32>,
    pub error: Option<String>,
}

impl TrackResult {
    pub fn ok(contact_email: String, health_score: i32) -> Self {
        Self {
            contact_email,
            success: true,
            health_score: Some(health_score),
            error: None,
        }
    }

    pub fn failed(contact_email: String, error: impl Into<String>) -> Self {
        Self {
            contact_email,
            success: false,
            health_score: None,
            error: Some(error.into()),
        }
    }
}
