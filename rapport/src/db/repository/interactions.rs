use chrono::Utc;
use libsql::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::error::{RapportError, Result};
use crate::models::{Interaction, SentimentLabel};

pub struct InteractionRepository;

impl InteractionRepository {
    pub async fn create(conn: &Connection, interaction: &Interaction) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO interactions (
                id, contact_id, email_id, direction, subject, sent_at, received_at,
                sentiment, sentiment_label, was_response, response_time_minutes, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
            )
            "#,
            params![
                interaction.id.clone(),
                interaction.contact_id.clone(),
                interaction.email_id.clone(),
                interaction.direction.as_str(),
                interaction.subject.clone(),
                interaction.sent_at.as_ref().map(format_timestamp),
                interaction.received_at.as_ref().map(format_timestamp),
                interaction.sentiment,
                interaction.sentiment_label.map(|label| label.as_str()),
                interaction.was_response as i32,
                interaction.response_time_minutes,
                format_timestamp(&interaction.created_at),
            ],
        )
        .await?;

        Ok(())
    }

    /// Most recent first, by the interaction's own timestamp.
    pub async fn list_by_contact(
        conn: &Connection,
        contact_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Interaction>> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(i64::from).unwrap_or(-1);
        let mut rows = conn
            .query(
                r#"
                SELECT id, contact_id, email_id, direction, subject, sent_at, received_at,
                       sentiment, sentiment_label, was_response, response_time_minutes, created_at
                FROM interactions
                WHERE contact_id = ?1
                ORDER BY COALESCE(sent_at, received_at, created_at) DESC, created_at DESC
                LIMIT ?2
                "#,
                params![contact_id, limit],
            )
            .await?;

        let mut interactions = Vec::new();
        while let Some(row) = rows.next().await? {
            interactions.push(Self::row_to_interaction(&row)?);
        }
        Ok(interactions)
    }

    fn row_to_interaction(row: &libsql::Row) -> Result<Interaction> {
        let direction = row.get::<String>(3)?.parse().map_err(|_| {
            RapportError::Internal("interaction row has an unknown direction".to_string())
        })?;
        let created_at: String = row.get(11)?;

        Ok(Interaction {
            id: row.get(0)?,
            contact_id: row.get(1)?,
            email_id: row.get(2)?,
            direction,
            subject: row.get(4)?,
            sent_at: row.get::<Option<String>>(5)?.as_deref().and_then(parse_timestamp),
            received_at: row.get::<Option<String>>(6)?.as_deref().and_then(parse_timestamp),
            sentiment: row.get::<Option<f64>>(7)?,
            sentiment_label: row
                .get::<Option<String>>(8)?
                .and_then(|label| label.parse::<SentimentLabel>().ok()),
            was_response: row.get::<i32>(9)? != 0,
            response_time_minutes: row.get::<Option<f64>>(10)?,
            created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
        })
    }
}
