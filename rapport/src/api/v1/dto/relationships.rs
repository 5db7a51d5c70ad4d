//! Relationship request/response DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::common::{V1Direction, V1SentimentLabel, V1SentimentTrend};
use crate::models::{Contact, ContactStats, Interaction, MessageEvent, TrackResult};
use crate::services::ContactDetail;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/relationships:track`.
///
/// Missing text fields default to empty; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackEventRequest {
    /// Source message id.
    pub email_id: Option<String>,
    /// Raw `From` header.
    pub from: String,
    /// Raw `To` header, possibly listing several recipients.
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Events without a recognised direction are accepted and track nothing.
    #[serde(deserialize_with = "lenient_direction")]
    pub direction: Option<V1Direction>,
    pub sent_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
}

/// Unknown or mistyped directions read as absent instead of failing the body.
fn lenient_direction<'de, D>(deserializer: D) -> Result<Option<V1Direction>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl From<TrackEventRequest> for MessageEvent {
    fn from(req: TrackEventRequest) -> Self {
        MessageEvent {
            email_id: req.email_id,
            from: req.from,
            to: req.to,
            subject: req.subject,
            body: req.body,
            direction: req.direction.map(Into::into),
            sent_at: req.sent_at,
            received_at: req.received_at,
        }
    }
}

/// Query parameters for `GET /api/v1/relationships`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsQuery {
    /// Maximum contacts to return (default 50, max 200).
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackResultResponse {
    pub contact_email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TrackResult> for TrackResultResponse {
    fn from(result: TrackResult) -> Self {
        Self {
            contact_email: result.contact_email,
            success: result.success,
            health_score: result.health_score,
            error: result.error,
        }
    }
}

/// Response for `POST /api/v1/relationships:track`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventResponse {
    /// One entry per distinct counterpart address, in header order.
    pub results: Vec<TrackResultResponse>,
}

/// Points earned by each health component.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthBreakdownResponse {
    /// Out of 30.
    pub recency: f64,
    /// Out of 25.
    pub response: f64,
    /// Out of 20.
    pub initiation: f64,
    /// Out of 15.
    pub sentiment: f64,
    /// Out of 10.
    pub commitment: f64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// 0-100.
    pub health_score: i32,
    pub breakdown: HealthBreakdownResponse,
    pub emails_sent: i32,
    pub emails_received: i32,
    pub total_emails: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_contact_at: Option<DateTime<Utc>>,
    pub avg_sentiment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_response_time_minutes: Option<f64>,
    pub commitments_made: i32,
    pub commitments_kept: i32,
    pub sentiment_trend: V1SentimentTrend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            email: c.email,
            display_name: c.display_name,
            health_score: c.health_score,
            breakdown: HealthBreakdownResponse {
                recency: c.recency_score,
                response: c.response_score,
                initiation: c.initiation_score,
                sentiment: c.sentiment_score,
                commitment: c.commitment_score,
            },
            emails_sent: c.emails_sent,
            emails_received: c.emails_received,
            total_emails: c.total_emails,
            last_contact_at: c.last_contact_at,
            avg_sentiment: c.avg_sentiment,
            avg_response_time_minutes: c.avg_response_time_minutes,
            commitments_made: c.commitments_made,
            commitments_kept: c.commitments_kept,
            sentiment_trend: c.sentiment_trend.into(),
            suggested_action: c.suggested_action,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    pub direction: V1Direction,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_label: Option<V1SentimentLabel>,
    pub was_response: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_minutes: Option<f64>,
}

impl From<Interaction> for InteractionResponse {
    fn from(i: Interaction) -> Self {
        Self {
            id: i.id,
            email_id: i.email_id,
            direction: i.direction.into(),
            subject: i.subject,
            sent_at: i.sent_at,
            received_at: i.received_at,
            sentiment: i.sentiment,
            sentiment_label: i.sentiment_label.map(Into::into),
            was_response: i.was_response,
            response_time_minutes: i.response_time_minutes,
        }
    }
}

/// Response for `GET /api/v1/relationships/{contactId}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetailResponse {
    pub contact: ContactResponse,
    /// Most recent first.
    pub recent_interactions: Vec<InteractionResponse>,
}

impl From<ContactDetail> for ContactDetailResponse {
    fn from(detail: ContactDetail) -> Self {
        Self {
            contact: detail.contact.into(),
            recent_interactions: detail
                .recent_interactions
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// Response for `GET /api/v1/relationships`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsResponse {
    /// Healthiest first.
    pub contacts: Vec<ContactResponse>,
}

/// Response for `GET /api/v1/relationships/stats`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_contacts: u64,
    pub average_health_score: f64,
    /// Score 75 and above.
    pub thriving: u64,
    /// Score 50 to 74.
    pub stable: u64,
    /// Score below 50.
    pub needs_attention: u64,
}

impl From<ContactStats> for StatsResponse {
    fn from(s: ContactStats) -> Self {
        Self {
            total_contacts: s.total_contacts,
            average_health_score: s.average_health_score,
            thriving: s.thriving,
            stable: s.stable,
            needs_attention: s.needs_attention,
        }
    }
}
