use std::sync::Arc;

use chrono::{DateTime, Utc};
use nanoid::nanoid;
use tracing::{debug, error, info};

use super::locks::KeyedLocks;
use crate::config::RelationshipConfig;
use crate::db::DatabaseBackend;
use crate::error::{RapportError, Result};
use crate::intelligence::health::{calculate_health, days_since};
use crate::intelligence::ledger::{latest_before, response_link};
use crate::intelligence::{
    extract_contact_addresses, generate_suggestion, ContactAddress, InteractionSummary,
    SentimentEstimator,
};
use crate::models::{
    Contact, ContactStats, Direction, Interaction, MessageEvent, Sentiment, TrackResult,
};

/// A contact together with its latest interactions.
#[derive(Debug, Clone)]
pub struct ContactDetail {
    pub contact: Contact,
    pub recent_interactions: Vec<Interaction>,
}

/// Keeps contact health in step with the user's mail traffic.
#[derive(Clone)]
pub struct RelationshipService {
    db: Arc<dyn DatabaseBackend>,
    sentiment: SentimentEstimator,
    config: RelationshipConfig,
    locks: KeyedLocks,
}

impl RelationshipService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        sentiment: SentimentEstimator,
        config: RelationshipConfig,
    ) -> Self {
        Self {
            db,
            sentiment,
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// Record a sent or received message against every counterpart address.
    ///
    /// Returns one result per distinct address. A failure for one contact is
    /// reported in its result and does not stop the others. Events without a
    /// direction or without any address produce no results.
    pub async fn track(&self, event: &MessageEvent, user_id: &str) -> Vec<TrackResult> {
        let (Some(direction), Some(field)) = (event.direction, event.counterpart_field()) else {
            debug!(user_id, "Ignoring message event without a direction");
            return Vec::new();
        };

        let addresses = extract_contact_addresses(field);
        if addresses.is_empty() {
            debug!(user_id, direction = %direction, "No counterpart addresses in message event");
            return Vec::new();
        }

        let occurred_at = event.occurred_at().unwrap_or_else(Utc::now);
        let sentiment = self.sentiment.estimate(&event.sentiment_text()).await;

        let mut results = Vec::with_capacity(addresses.len());
        for address in addresses {
            let outcome = self
                .track_contact(user_id, &address, event, direction, occurred_at, sentiment)
                .await;

            match outcome {
                Ok(contact) => {
                    debug!(
                        contact_id = %contact.id,
                        health_score = contact.health_score,
                        "Tracked interaction"
                    );
                    results.push(TrackResult::ok(contact.email, contact.health_score));
                }
                Err(e) => {
                    error!(user_id, email = %address.email, error = %e, "Failed to track contact");
                    results.push(TrackResult::failed(address.email, e.to_string()));
                }
            }
        }

        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            user_id,
            direction = %direction,
            contacts = results.len(),
            failed,
            "Message event tracked"
        );
        results
    }

    async fn track_contact(
        &self,
        user_id: &str,
        address: &ContactAddress,
        event: &MessageEvent,
        direction: Direction,
        occurred_at: DateTime<Utc>,
        sentiment: Sentiment,
    ) -> Result<Contact> {
        let _guard = self.locks.lock(&lock_key(user_id, &address.email)).await;

        let mut contact = match self.db.find_contact_by_email(user_id, &address.email).await? {
            Some(contact) => contact,
            None => {
                let contact = Contact::new(
                    nanoid!(),
                    user_id.to_string(),
                    &address.email,
                    address.display_name.clone(),
                );
                self.db.create_contact(&contact).await?
            }
        };
        if contact.display_name.is_none() {
            contact.display_name = address.display_name.clone();
        }

        let history = self
            .db
            .list_interactions_by_contact(&contact.id, None)
            .await?;
        let (was_response, response_time_minutes) =
            response_link(latest_before(&history, occurred_at), direction, occurred_at);

        let mut interaction = Interaction::new(
            nanoid!(),
            contact.id.clone(),
            direction,
            event.subject.clone(),
            occurred_at,
        );
        interaction.email_id = event.email_id.clone();
        interaction.sentiment = Some(sentiment.score);
        interaction.sentiment_label = Some(sentiment.label);
        interaction.was_response = was_response;
        interaction.response_time_minutes = response_time_minutes;
        self.db.create_interaction(&interaction).await?;

        self.refresh(contact, Utc::now()).await
    }

    /// Rebuild a contact's aggregates and score from its stored history
    /// without recording anything new. Running it twice changes nothing.
    pub async fn recalculate(&self, user_id: &str, contact_id: &str) -> Result<Contact> {
        let contact = self.require_contact(user_id, contact_id).await?;
        let _guard = self.locks.lock(&lock_key(user_id, &contact.email)).await;

        // Re-read under the lock so a concurrent track is not overwritten.
        let contact = self.require_contact(user_id, contact_id).await?;
        let contact = self.refresh(contact, Utc::now()).await?;
        info!(
            contact_id,
            health_score = contact.health_score,
            "Relationship recalculated"
        );
        Ok(contact)
    }

    async fn refresh(&self, mut contact: Contact, now: DateTime<Utc>) -> Result<Contact> {
        let history = self
            .db
            .list_interactions_by_contact(&contact.id, None)
            .await?;
        let summary = InteractionSummary::from_history(&history);

        let input = summary.health_input(
            contact.commitments_made.max(0) as u32,
            contact.commitments_kept.max(0) as u32,
        );
        let breakdown = calculate_health(&input, now);
        let days = summary
            .last_contact_at
            .map(|last| days_since(last, now))
            .unwrap_or(f64::INFINITY);

        contact.emails_sent = summary.emails_sent as i32;
        contact.emails_received = summary.emails_received as i32;
        contact.total_emails = summary.total_emails() as i32;
        contact.last_contact_at = summary.last_contact_at;
        contact.avg_sentiment = summary.avg_sentiment;
        contact.avg_response_time_minutes = summary.avg_response_time_minutes;
        contact.sentiment_trend = summary.sentiment_trend;
        contact.recency_score = breakdown.recency;
        contact.response_score = breakdown.response;
        contact.initiation_score = breakdown.initiation;
        contact.sentiment_score = breakdown.sentiment;
        contact.commitment_score = breakdown.commitment;
        contact.health_score = breakdown.total;
        contact.suggested_action =
            generate_suggestion(breakdown.total, summary.last_contact_at, days);
        contact.updated_at = now;

        self.db.update_contact(&contact).await?;
        Ok(contact)
    }

    pub async fn list_contacts(&self, user_id: &str, limit: u32) -> Result<Vec<Contact>> {
        self.db.list_contacts(user_id, limit).await
    }

    pub async fn get_contact(&self, user_id: &str, contact_id: &str) -> Result<ContactDetail> {
        let contact = self.require_contact(user_id, contact_id).await?;
        let recent_interactions = self
            .db
            .list_interactions_by_contact(&contact.id, Some(self.config.recent_interactions_limit))
            .await?;
        Ok(ContactDetail {
            contact,
            recent_interactions,
        })
    }

    pub async fn stats(&self, user_id: &str) -> Result<ContactStats> {
        self.db.get_contact_stats(user_id).await
    }

    async fn require_contact(&self, user_id: &str, contact_id: &str) -> Result<Contact> {
        self.db
            .get_contact_by_id(user_id, contact_id)
            .await?
            .ok_or_else(|| RapportError::NotFound(format!("Contact {contact_id} not found")))
    }
}

fn lock_key(user_id: &str, email: &str) -> String {
    format!("{user_id}\u{0}{email}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{ContactStore, Database, InteractionStore, LibSqlBackend};
    use crate::intelligence::suggestion::COMMITMENTS_SUGGESTION;
    use crate::llm::LlmProvider;
    use crate::models::SentimentTrend;
    use async_trait::async_trait;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    async fn setup_backend() -> (Arc<LibSqlBackend>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::new(&DatabaseConfig {
            url: temp_file.path().to_str().unwrap().to_string(),
            auth_token: None,
            local_path: None,
        })
        .await
        .unwrap();
        (Arc::new(LibSqlBackend::new(db)), temp_file)
    }

    fn service_for(db: Arc<dyn DatabaseBackend>) -> RelationshipService {
        RelationshipService::new(
            db,
            SentimentEstimator::new(LlmProvider::unavailable("tests"), 1),
            RelationshipConfig::default(),
        )
    }

    fn inbound(from: &str, body: &str, at: DateTime<Utc>) -> MessageEvent {
        MessageEvent {
            email_id: Some(nanoid!()),
            from: from.to_string(),
            to: "me@mail.test".to_string(),
            subject: "Update".to_string(),
            body: body.to_string(),
            direction: Some(Direction::Inbound),
            sent_at: None,
            received_at: Some(at),
        }
    }

    fn outbound(to: &str, body: &str, at: DateTime<Utc>) -> MessageEvent {
        MessageEvent {
            email_id: Some(nanoid!()),
            from: "me@mail.test".to_string(),
            to: to.to_string(),
            subject: "Update".to_string(),
            body: body.to_string(),
            direction: Some(Direction::Outbound),
            sent_at: Some(at),
            received_at: None,
        }
    }

    /// Fails contact creation for one address and delegates everything else.
    struct FlakyBackend {
        inner: Arc<LibSqlBackend>,
        broken_email: &'static str,
    }

    #[async_trait]
    impl ContactStore for FlakyBackend {
        async fn find_contact_by_email(
            &self,
            user_id: &str,
            email: &str,
        ) -> Result<Option<Contact>> {
            self.inner.find_contact_by_email(user_id, email).await
        }
        async fn get_contact_by_id(&self, user_id: &str, id: &str) -> Result<Option<Contact>> {
            self.inner.get_contact_by_id(user_id, id).await
        }
        async fn create_contact(&self, contact: &Contact) -> Result<Contact> {
            if contact.email == self.broken_email {
                return Err(RapportError::Internal("disk full".to_string()));
            }
            self.inner.create_contact(contact).await
        }
        async fn update_contact(&self, contact: &Contact) -> Result<()> {
            self.inner.update_contact(contact).await
        }
        async fn list_contacts(&self, user_id: &str, limit: u32) -> Result<Vec<Contact>> {
            self.inner.list_contacts(user_id, limit).await
        }
        async fn get_contact_stats(&self, user_id: &str) -> Result<ContactStats> {
            self.inner.get_contact_stats(user_id).await
        }
    }

    #[async_trait]
    impl InteractionStore for FlakyBackend {
        async fn create_interaction(&self, interaction: &Interaction) -> Result<()> {
            self.inner.create_interaction(interaction).await
        }
        async fn list_interactions_by_contact(
            &self,
            contact_id: &str,
            limit: Option<u32>,
        ) -> Result<Vec<Interaction>> {
            self.inner
                .list_interactions_by_contact(contact_id, limit)
                .await
        }
    }

    #[async_trait]
    impl DatabaseBackend for FlakyBackend {
        async fn sync(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_first_inbound_message_creates_scored_contact() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());

        let event = inbound("\"Dana Lee\" <Dana@Example.com>", "See you on Monday", Utc::now());
        let results = service.track(&event, "u1").await;

        // 30 recency + 10 response + 10 initiation + 7.5 neutral sentiment
        assert_eq!(
            results,
            vec![TrackResult::ok("dana@example.com".to_string(), 58)]
        );

        let contact = backend
            .find_contact_by_email("u1", "dana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.display_name.as_deref(), Some("Dana Lee"));
        assert_eq!(contact.emails_received, 1);
        assert_eq!(contact.emails_sent, 0);
        assert_eq!(contact.total_emails, 1);
        assert_eq!(contact.health_score, 58);
        assert_eq!(contact.recency_score, 30.0);
        assert_eq!(contact.sentiment_trend, SentimentTrend::Stable);
        assert_eq!(
            contact.suggested_action.as_deref(),
            Some(COMMITMENTS_SUGGESTION)
        );

        let history = backend
            .list_interactions_by_contact(&contact.id, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].email_id, event.email_id);
        assert!(!history[0].was_response);
    }

    #[tokio::test]
    async fn test_one_event_updates_every_recipient() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());

        let event = outbound("a@x.com, Bea <b@x.com>, A@X.com", "Agenda attached", Utc::now());
        let results = service.track(&event, "u1").await;

        let emails: Vec<&str> = results.iter().map(|r| r.contact_email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
        assert!(results.iter().all(|r| r.success));

        for email in ["a@x.com", "b@x.com"] {
            let contact = backend
                .find_contact_by_email("u1", email)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(contact.emails_sent, 1);
            assert_eq!(contact.total_emails, 1);
        }
    }

    #[tokio::test]
    async fn test_positive_outbound_scores_each_recipient() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());

        // "thank", "great", "wonderful": 3 keyword hits, 0.6 overall.
        let event = outbound("a@x.com, b@x.com", "Thanks, great and wonderful", Utc::now());
        let results = service.track(&event, "u1").await;

        // 30 recency + 10 response + 10 initiation + 12 sentiment + 0 commitment
        assert_eq!(
            results,
            vec![
                TrackResult::ok("a@x.com".to_string(), 62),
                TrackResult::ok("b@x.com".to_string(), 62),
            ]
        );

        let mut interaction_ids = Vec::new();
        for email in ["a@x.com", "b@x.com"] {
            let contact = backend
                .find_contact_by_email("u1", email)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(contact.emails_sent, 1);
            assert_eq!(contact.emails_received, 0);
            assert_eq!(contact.total_emails, 1);
            assert_eq!(contact.recency_score, 30.0);
            assert_eq!(contact.response_score, 10.0);
            assert_eq!(contact.initiation_score, 10.0);
            assert!((contact.avg_sentiment - 0.6).abs() < 1e-9);
            assert!((contact.sentiment_score - (0.6 + 1.0) / 2.0 * 15.0).abs() < 1e-9);
            assert_eq!(contact.commitment_score, 0.0);
            assert_eq!(contact.health_score, 62);
            assert_eq!(
                contact.suggested_action.as_deref(),
                Some(COMMITMENTS_SUGGESTION)
            );

            let history = backend
                .list_interactions_by_contact(&contact.id, None)
                .await
                .unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].contact_id, contact.id);
            assert_eq!(history[0].direction, Direction::Outbound);
            assert!((history[0].sentiment.unwrap() - 0.6).abs() < 1e-9);
            interaction_ids.push(history[0].id.clone());
        }
        assert_ne!(interaction_ids[0], interaction_ids[1]);
    }

    #[tokio::test]
    async fn test_malformed_events_track_nothing() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());

        let mut no_direction = inbound("a@x.com", "hi", Utc::now());
        no_direction.direction = None;
        assert!(service.track(&no_direction, "u1").await.is_empty());

        let no_address = inbound("undisclosed-recipients:;", "hi", Utc::now());
        assert!(service.track(&no_address, "u1").await.is_empty());

        assert_eq!(service.stats("u1").await.unwrap().total_contacts, 0);
    }

    #[tokio::test]
    async fn test_failure_for_one_contact_does_not_stop_others() {
        let (inner, _tmp) = setup_backend().await;
        let flaky = Arc::new(FlakyBackend {
            inner: inner.clone(),
            broken_email: "broken@x.com",
        });
        let service = service_for(flaky);

        let event = outbound("broken@x.com, ok@x.com", "Notes", Utc::now());
        let results = service.track(&event, "u1").await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].contact_email, "broken@x.com");
        assert!(!results[0].success);
        assert!(results[0].health_score.is_none());
        assert!(results[0].error.as_deref().unwrap().contains("disk full"));

        assert_eq!(results[1].contact_email, "ok@x.com");
        assert!(results[1].success);
        assert!(inner
            .find_contact_by_email("u1", "ok@x.com")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_reply_records_response_time() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());
        let start = Utc::now() - Duration::hours(2);

        service
            .track(&inbound("pat@x.com", "Question for you", start), "u1")
            .await;
        service
            .track(
                &outbound("pat@x.com", "Answer", start + Duration::minutes(30)),
                "u1",
            )
            .await;
        // Same direction again: not a response.
        service
            .track(
                &outbound("pat@x.com", "One more thing", start + Duration::minutes(40)),
                "u1",
            )
            .await;

        let contact = backend
            .find_contact_by_email("u1", "pat@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.avg_response_time_minutes, Some(30.0));
        assert_eq!(contact.emails_sent, 2);
        assert_eq!(contact.emails_received, 1);

        let history = backend
            .list_interactions_by_contact(&contact.id, None)
            .await
            .unwrap();
        let responses: Vec<bool> = history.iter().map(|i| i.was_response).collect();
        assert_eq!(responses, vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_concurrent_events_for_one_contact_are_all_counted() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());
        let now = Utc::now();

        let events: Vec<MessageEvent> = (0..12)
            .map(|n| inbound("busy@x.com", "ping", now - Duration::minutes(n)))
            .collect();
        let results =
            futures::future::join_all(events.iter().map(|e| service.track(e, "u1"))).await;
        assert!(results.iter().flatten().all(|r| r.success));

        let contact = backend
            .find_contact_by_email("u1", "busy@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.total_emails, 12);
        assert_eq!(contact.emails_received, 12);
        assert_eq!(service.stats("u1").await.unwrap().total_contacts, 1);
    }

    #[tokio::test]
    async fn test_recalculate_is_idempotent() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend.clone());
        let now = Utc::now();

        service
            .track(&inbound("kim@x.com", "Thanks, great work", now), "u1")
            .await;
        service
            .track(&outbound("kim@x.com", "Glad it helped", now), "u1")
            .await;

        let contact = backend
            .find_contact_by_email("u1", "kim@x.com")
            .await
            .unwrap()
            .unwrap();

        let first = service.recalculate("u1", &contact.id).await.unwrap();
        let second = service.recalculate("u1", &contact.id).await.unwrap();

        assert_eq!(first.health_score, contact.health_score);
        assert_eq!(second.health_score, first.health_score);
        assert_eq!(second.total_emails, 2);
        assert_eq!(second.avg_sentiment, first.avg_sentiment);
        assert_eq!(second.suggested_action, first.suggested_action);

        let history = backend
            .list_interactions_by_contact(&contact.id, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_recalculate_unknown_contact_is_not_found() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend);
        let err = service.recalculate("u1", "missing").await.unwrap_err();
        assert!(matches!(err, RapportError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_queries_are_scoped_to_user() {
        let (backend, _tmp) = setup_backend().await;
        let service = service_for(backend);
        let now = Utc::now();

        service.track(&inbound("a@x.com", "hello", now), "u1").await;
        service.track(&inbound("b@x.com", "hello", now), "u1").await;
        service.track(&inbound("c@x.com", "hello", now), "u2").await;

        let contacts = service.list_contacts("u1", 10).await.unwrap();
        assert_eq!(contacts.len(), 2);

        let detail = service.get_contact("u1", &contacts[0].id).await.unwrap();
        assert_eq!(detail.recent_interactions.len(), 1);

        let err = service.get_contact("u2", &contacts[0].id).await.unwrap_err();
        assert!(matches!(err, RapportError::NotFound(_)));

        let stats = service.stats("u1").await.unwrap();
        assert_eq!(stats.total_contacts, 2);
        assert_eq!(stats.needs_attention + stats.stable + stats.thriving, 2);
    }
}
