//! Wire enums shared by the relationship DTOs.

use serde::{Deserialize, Serialize};

use crate::models::{Direction, SentimentLabel, SentimentTrend};

/// Wire format: `"inbound"` or `"outbound"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum V1Direction {
    /// Received by the user.
    Inbound,
    /// Sent by the user.
    Outbound,
}

impl From<V1Direction> for Direction {
    fn from(d: V1Direction) -> Self {
        match d {
            V1Direction::Inbound => Direction::Inbound,
            V1Direction::Outbound => Direction::Outbound,
        }
    }
}

impl From<Direction> for V1Direction {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Inbound => V1Direction::Inbound,
            Direction::Outbound => V1Direction::Outbound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum V1SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl From<SentimentLabel> for V1SentimentLabel {
    fn from(label: SentimentLabel) -> Self {
        match label {
            SentimentLabel::Positive => V1SentimentLabel::Positive,
            SentimentLabel::Negative => V1SentimentLabel::Negative,
            SentimentLabel::Neutral => V1SentimentLabel::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum V1SentimentTrend {
    Improving,
    Declining,
    Stable,
}

impl From<SentimentTrend> for V1SentimentTrend {
    fn from(trend: SentimentTrend) -> Self {
        match trend {
            SentimentTrend::Improving => V1SentimentTrend::Improving,
            SentimentTrend::Declining => V1SentimentTrend::Declining,
            SentimentTrend::Stable => V1SentimentTrend::Stable,
        }
    }
}
