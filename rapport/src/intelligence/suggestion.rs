use chrono::{DateTime, Utc};

pub const THRIVING_SUGGESTION: &str =
    "Relationship is thriving! Consider a personal check-in to keep the momentum going.";
pub const SCHEDULE_CALL_SUGGESTION: &str =
    "It has been over two months. Schedule a call or video chat to reconnect.";
pub const CHECK_IN_SUGGESTION: &str = "Send a quick check-in email to stay in touch.";
pub const PENDING_REPLY_SUGGESTION: &str =
    "Respond to any pending emails to keep the conversation going.";
pub const COMMITMENTS_SUGGESTION: &str = "Follow up on your commitments to build trust.";

/// Scores at or above this need no nudge (until they reach thriving).
const HEALTHY_THRESHOLD: i32 = 75;
const THRIVING_THRESHOLD: i32 = 90;

/// Pick the next action for a contact, or `None` when nothing is needed.
///
/// A contact with no recorded contact at all is treated as long overdue.
pub fn generate_suggestion(
    score: i32,
    last_contact_at: Option<DateTime<Utc>>,
    days_since_contact: f64,
) -> Option<String> {
    if score >= THRIVING_THRESHOLD {
        return Some(THRIVING_SUGGESTION.to_string());
    }
    if score >= HEALTHY_THRESHOLD {
        return None;
    }

    let days = if last_contact_at.is_none() || days_since_contact.is_nan() {
        f64::INFINITY
    } else {
        days_since_contact
    };

    let suggestion = if days > 60.0 {
        SCHEDULE_CALL_SUGGESTION
    } else if days > 30.0 {
        CHECK_IN_SUGGESTION
    } else if days > 14.0 {
        PENDING_REPLY_SUGGESTION
    } else {
        COMMITMENTS_SUGGESTION
    };

    Some(suggestion.to_string())
}
