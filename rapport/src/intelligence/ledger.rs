//! Aggregation over a contact's interaction history.
//!
//! Aggregates are always rebuilt from the full history rather than patched
//! incrementally, so re-running over the same history is idempotent.

use chrono::{DateTime, Utc};

use super::health::HealthInput;
use crate::models::{Direction, Interaction, SentimentTrend};

/// Number of most recent interactions compared against the all-time mean.
pub const TREND_WINDOW: usize = 10;
/// Below this many interactions the trend is always `Stable`.
pub const TREND_MIN_INTERACTIONS: usize = 5;
const TREND_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSummary {
    pub emails_sent: u32,
    pub emails_received: u32,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub avg_sentiment: f64,
    pub avg_response_time_minutes: Option<f64>,
    pub sentiment_trend: SentimentTrend,
}

impl InteractionSummary {
    pub fn from_history(history: &[Interaction]) -> Self {
        let ordered = recent_first(history);

        let emails_sent = ordered
            .iter()
            .filter(|i| i.direction == Direction::Outbound)
            .count() as u32;
        let emails_received = ordered
            .iter()
            .filter(|i| i.direction == Direction::Inbound)
            .count() as u32;

        let last_contact_at = ordered.iter().find_map(|i| i.occurred_at());

        let sentiments: Vec<f64> = ordered.iter().filter_map(|i| i.sentiment).collect();
        let avg_sentiment = mean(&sentiments).unwrap_or(0.0);

        let response_times: Vec<f64> = ordered
            .iter()
            .filter(|i| i.was_response)
            .filter_map(|i| i.response_time_minutes)
            .collect();
        let avg_response_time_minutes = mean(&response_times);

        let sentiment_trend = if ordered.len() < TREND_MIN_INTERACTIONS {
            SentimentTrend::Stable
        } else {
            let recent: Vec<f64> = ordered
                .iter()
                .take(TREND_WINDOW)
                .filter_map(|i| i.sentiment)
                .collect();
            trend_between(mean(&recent).unwrap_or(avg_sentiment), avg_sentiment)
        };

        Self {
            emails_sent,
            emails_received,
            last_contact_at,
            avg_sentiment,
            avg_response_time_minutes,
            sentiment_trend,
        }
    }

    pub fn total_emails(&self) -> u32 {
        self.emails_sent + self.emails_received
    }

    pub fn health_input(&self, commitments_made: u32, commitments_kept: u32) -> HealthInput {
        HealthInput {
            last_contact_at: self.last_contact_at,
            avg_response_time_minutes: self.avg_response_time_minutes,
            emails_sent: self.emails_sent,
            emails_received: self.emails_received,
            avg_sentiment: self.avg_sentiment,
            commitments_made,
            commitments_kept,
        }
    }
}

fn trend_between(recent_avg: f64, overall_avg: f64) -> SentimentTrend {
    let delta = recent_avg - overall_avg;
    if delta > TREND_THRESHOLD {
        SentimentTrend::Improving
    } else if delta < -TREND_THRESHOLD {
        SentimentTrend::Declining
    } else {
        SentimentTrend::Stable
    }
}

/// Decide whether a new interaction answers the previous one.
///
/// It does when the most recent earlier interaction went the other way; the
/// response time is the gap in minutes (never negative).
pub fn response_link(
    previous: Option<&Interaction>,
    direction: Direction,
    occurred_at: DateTime<Utc>,
) -> (bool, Option<f64>) {
    let Some(previous) = previous else {
        return (false, None);
    };
    if previous.direction != direction.opposite() {
        return (false, None);
    }
    let Some(previous_at) = previous.occurred_at() else {
        return (true, None);
    };
    let minutes = (occurred_at - previous_at).num_seconds() as f64 / 60.0;
    (true, Some(minutes.max(0.0)))
}

/// Most recent interaction at or before `at`.
pub fn latest_before(history: &[Interaction], at: DateTime<Utc>) -> Option<&Interaction> {
    history
        .iter()
        .filter(|i| i.occurred_at().is_some_and(|t| t <= at))
        .max_by_key(|i| sort_key(i))
}

fn sort_key(interaction: &Interaction) -> DateTime<Utc> {
    interaction.occurred_at().unwrap_or(interaction.created_at)
}

fn recent_first(history: &[Interaction]) -> Vec<&Interaction> {
    let mut ordered: Vec<&Interaction> = history.iter().collect();
    ordered.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    ordered
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn interaction(n: i64, direction: Direction, sentiment: Option<f64>) -> Interaction {
        let mut i = Interaction::new(
            format!("i{n}"),
            "c1".to_string(),
            direction,
            format!("subject {n}"),
            base() + Duration::hours(n),
        );
        i.sentiment = sentiment;
        i
    }

    #[test]
    fn test_empty_history() {
        let summary = InteractionSummary::from_history(&[]);
        assert_eq!(summary.emails_sent, 0);
        assert_eq!(summary.emails_received, 0);
        assert_eq!(summary.total_emails(), 0);
        assert!(summary.last_contact_at.is_none());
        assert_eq!(summary.avg_sentiment, 0.0);
        assert!(summary.avg_response_time_minutes.is_none());
        assert_eq!(summary.sentiment_trend, SentimentTrend::Stable);
    }

    #[test]
    fn test_counts_and_last_contact() {
        let history = vec![
            interaction(1, Direction::Outbound, Some(0.2)),
            interaction(3, Direction::Inbound, Some(0.4)),
            interaction(2, Direction::Outbound, None),
        ];
        let summary = InteractionSummary::from_history(&history);
        assert_eq!(summary.emails_sent, 2);
        assert_eq!(summary.emails_received, 1);
        assert_eq!(summary.last_contact_at, Some(base() + Duration::hours(3)));
        // Interactions without a sentiment are ignored in the mean.
        assert!((summary.avg_sentiment - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_trend_needs_five_interactions() {
        let history: Vec<Interaction> = (0..4)
            .map(|n| interaction(n, Direction::Inbound, Some(if n == 3 { 1.0 } else { -1.0 })))
            .collect();
        let summary = InteractionSummary::from_history(&history);
        assert_eq!(summary.sentiment_trend, SentimentTrend::Stable);
    }

    #[test]
    fn test_trend_improving_and_declining() {
        // Ten old negative interactions, then ten recent positive ones.
        let mut history: Vec<Interaction> = (0..10)
            .map(|n| interaction(n, Direction::Inbound, Some(-0.5)))
            .collect();
        history.extend((10..20).map(|n| interaction(n, Direction::Outbound, Some(0.5))));
        let summary = InteractionSummary::from_history(&history);
        assert_eq!(summary.sentiment_trend, SentimentTrend::Improving);

        let mut history: Vec<Interaction> = (0..10)
            .map(|n| interaction(n, Direction::Inbound, Some(0.6)))
            .collect();
        history.extend((10..20).map(|n| interaction(n, Direction::Outbound, Some(-0.2))));
        let summary = InteractionSummary::from_history(&history);
        assert_eq!(summary.sentiment_trend, SentimentTrend::Declining);
    }

    #[test]
    fn test_short_history_trend_is_stable() {
        // With at most ten interactions the window is the whole history.
        let history: Vec<Interaction> = (0..6)
            .map(|n| interaction(n, Direction::Inbound, Some(n as f64 / 10.0)))
            .collect();
        let summary = InteractionSummary::from_history(&history);
        assert_eq!(summary.sentiment_trend, SentimentTrend::Stable);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let history: Vec<Interaction> = (0..12)
            .map(|n| {
                let direction = if n % 3 == 0 {
                    Direction::Inbound
                } else {
                    Direction::Outbound
                };
                interaction(n, direction, Some((n as f64 - 6.0) / 10.0))
            })
            .collect();
        let first = InteractionSummary::from_history(&history);
        let second = InteractionSummary::from_history(&history);
        assert_eq!(first, second);
    }

    #[test]
    fn test_response_times_are_averaged() {
        let mut a = interaction(1, Direction::Inbound, None);
        a.was_response = true;
        a.response_time_minutes = Some(30.0);
        let mut b = interaction(2, Direction::Outbound, None);
        b.was_response = true;
        b.response_time_minutes = Some(90.0);
        let c = interaction(3, Direction::Outbound, None);

        let summary = InteractionSummary::from_history(&[a, b, c]);
        assert_eq!(summary.avg_response_time_minutes, Some(60.0));
    }

    #[test]
    fn test_response_link() {
        let previous = interaction(0, Direction::Inbound, None);
        let at = base() + Duration::minutes(45);

        assert_eq!(
            response_link(Some(&previous), Direction::Outbound, at),
            (true, Some(45.0))
        );
        assert_eq!(
            response_link(Some(&previous), Direction::Inbound, at),
            (false, None)
        );
        assert_eq!(response_link(None, Direction::Outbound, at), (false, None));
    }

    #[test]
    fn test_latest_before_ignores_later_interactions() {
        let history = vec![
            interaction(1, Direction::Inbound, None),
            interaction(5, Direction::Outbound, None),
            interaction(3, Direction::Outbound, None),
        ];
        let found = latest_before(&history, base() + Duration::hours(4)).unwrap();
        assert_eq!(found.id, "i3");
        assert!(latest_before(&history, base()).is_none());
    }

    #[test]
    fn test_health_input_carries_summary() {
        let history = vec![
            interaction(1, Direction::Outbound, Some(0.5)),
            interaction(2, Direction::Inbound, Some(0.5)),
        ];
        let input = InteractionSummary::from_history(&history).health_input(2, 1);
        assert_eq!(input.emails_sent, 1);
        assert_eq!(input.emails_received, 1);
        assert_eq!(input.commitments_made, 2);
        assert_eq!(input.commitments_kept, 1);
        assert_eq!(input.avg_sentiment, 0.5);
    }
}
