use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RapportError;

/// Which side of the conversation a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The contact wrote to the user.
    Inbound,
    /// The user wrote to the contact.
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Inbound => Direction::Outbound,
            Direction::Outbound => Direction::Inbound,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = RapportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inbound" => Ok(Direction::Inbound),
            "outbound" => Ok(Direction::Outbound),
            other => Err(RapportError::Validation(format!(
                "Unknown direction: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SentimentLabel {
    /// Label thresholds shared by every sentiment source.
    pub fn from_score(score: f64) -> Self {
        if score > 0.2 {
            SentimentLabel::Positive
        } else if score < -0.2 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = RapportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            other => Err(RapportError::Validation(format!(
                "Unknown sentiment label: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentimentTrend {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl SentimentTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentTrend::Improving => "improving",
            SentimentTrend::Declining => "declining",
            SentimentTrend::Stable => "stable",
        }
    }
}

impl fmt::Display for SentimentTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentTrend {
    type Err = RapportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "improving" => Ok(SentimentTrend::Improving),
            "declining" => Ok(SentimentTrend::Declining),
            "stable" => Ok(SentimentTrend::Stable),
            other => Err(RapportError::Validation(format!(
                "Unknown sentiment trend: {other}"
            ))),
        }
    }
}

/// A sentiment reading for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Always within `[-1.0, 1.0]`.
    pub score: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    pub fn new(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            score,
            label: SentimentLabel::from_score(score),
        }
    }

    pub fn neutral() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_thresholds_are_exclusive() {
        assert_eq!(SentimentLabel::from_score(0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(0.21), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-0.2), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.21), SentimentLabel::Negative);
    }

    #[test]
    fn test_sentiment_new_clamps_and_sanitizes() {
        assert_eq!(Sentiment::new(3.0).score, 1.0);
        assert_eq!(Sentiment::new(-7.5).score, -1.0);
        assert_eq!(Sentiment::new(f64::NAN).score, 0.0);
        assert_eq!(Sentiment::new(f64::NAN).label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Outbound".parse::<Direction>().unwrap(), Direction::Outbound);
        assert_eq!(" inbound ".parse::<Direction>().unwrap(), Direction::Inbound);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Inbound.opposite(), Direction::Outbound);
    }

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(
            serde_json::to_value(SentimentTrend::Improving).unwrap(),
            "improving"
        );
        assert_eq!(serde_json::to_value(Direction::Outbound).unwrap(), "outbound");
        assert_eq!(
            serde_json::to_value(SentimentLabel::Negative).unwrap(),
            "negative"
        );
    }
}
