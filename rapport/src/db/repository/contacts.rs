use chrono::Utc;
use libsql::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::error::{RapportError, Result};
use crate::models::{Contact, ContactStats, SentimentTrend};

const CONTACT_COLUMNS: &str = r#"
    id, user_id, email, display_name, health_score,
    emails_sent, emails_received, total_emails, last_contact_at,
    recency_score, response_score, initiation_score, sentiment_score, commitment_score,
    avg_sentiment, avg_response_time_minutes, commitments_made, commitments_kept,
    sentiment_trend, suggested_action, created_at, updated_at
"#;

pub struct ContactRepository;

impl ContactRepository {
    pub async fn find_by_email(
        conn: &Connection,
        user_id: &str,
        email: &str,
    ) -> Result<Option<Contact>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = ?1 AND email = ?2"
        );
        let mut rows = conn
            .query(&sql, params![user_id, email.trim().to_lowercase()])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_contact(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_by_id(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE user_id = ?1 AND id = ?2");
        let mut rows = conn.query(&sql, params![user_id, id]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::row_to_contact(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert a contact. When the address is already tracked for the user the
    /// stored row wins, picking up `display_name` only if it had none.
    pub async fn create(conn: &Connection, contact: &Contact) -> Result<Contact> {
        conn.execute(
            r#"
            INSERT INTO contacts (
                id, user_id, email, display_name, health_score,
                emails_sent, emails_received, total_emails, last_contact_at,
                recency_score, response_score, initiation_score, sentiment_score, commitment_score,
                avg_sentiment, avg_response_time_minutes, commitments_made, commitments_kept,
                sentiment_trend, suggested_action, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
            )
            ON CONFLICT (user_id, email) DO UPDATE SET
                display_name = COALESCE(contacts.display_name, excluded.display_name)
            "#,
            params![
                contact.id.clone(),
                contact.user_id.clone(),
                contact.email.trim().to_lowercase(),
                contact.display_name.clone(),
                contact.health_score,
                contact.emails_sent,
                contact.emails_received,
                contact.total_emails,
                contact.last_contact_at.as_ref().map(format_timestamp),
                contact.recency_score,
                contact.response_score,
                contact.initiation_score,
                contact.sentiment_score,
                contact.commitment_score,
                contact.avg_sentiment,
                contact.avg_response_time_minutes,
                contact.commitments_made,
                contact.commitments_kept,
                contact.sentiment_trend.as_str(),
                contact.suggested_action.clone(),
                format_timestamp(&contact.created_at),
                format_timestamp(&contact.updated_at),
            ],
        )
        .await?;

        Self::find_by_email(conn, &contact.user_id, &contact.email)
            .await?
            .ok_or_else(|| {
                RapportError::Internal(format!("contact {} vanished after insert", contact.id))
            })
    }

    pub async fn update(conn: &Connection, contact: &Contact) -> Result<()> {
        let rows_affected = conn
            .execute(
                r#"
                UPDATE contacts SET
                    display_name = ?3,
                    health_score = ?4,
                    emails_sent = ?5,
                    emails_received = ?6,
                    total_emails = ?7,
                    last_contact_at = ?8,
                    recency_score = ?9,
                    response_score = ?10,
                    initiation_score = ?11,
                    sentiment_score = ?12,
                    commitment_score = ?13,
                    avg_sentiment = ?14,
                    avg_response_time_minutes = ?15,
                    commitments_made = ?16,
                    commitments_kept = ?17,
                    sentiment_trend = ?18,
                    suggested_action = ?19,
                    updated_at = ?20
                WHERE id = ?1 AND user_id = ?2
                "#,
                params![
                    contact.id.clone(),
                    contact.user_id.clone(),
                    contact.display_name.clone(),
                    contact.health_score,
                    contact.emails_sent,
                    contact.emails_received,
                    contact.total_emails,
                    contact.last_contact_at.as_ref().map(format_timestamp),
                    contact.recency_score,
                    contact.response_score,
                    contact.initiation_score,
                    contact.sentiment_score,
                    contact.commitment_score,
                    contact.avg_sentiment,
                    contact.avg_response_time_minutes,
                    contact.commitments_made,
                    contact.commitments_kept,
                    contact.sentiment_trend.as_str(),
                    contact.suggested_action.clone(),
                    format_timestamp(&Utc::now()),
                ],
            )
            .await?;

        if rows_affected == 0 {
            return Err(RapportError::NotFound(format!(
                "Contact {} not found",
                contact.id
            )));
        }
        Ok(())
    }

    pub async fn list(conn: &Connection, user_id: &str, limit: u32) -> Result<Vec<Contact>> {
        let sql = format!(
            r#"
            SELECT {CONTACT_COLUMNS} FROM contacts
            WHERE user_id = ?1
            ORDER BY health_score DESC, last_contact_at IS NULL, last_contact_at DESC
            LIMIT ?2
            "#
        );
        let mut rows = conn.query(&sql, params![user_id, limit as i64]).await?;

        let mut contacts = Vec::new();
        while let Some(row) = rows.next().await? {
            contacts.push(Self::row_to_contact(&row)?);
        }
        Ok(contacts)
    }

    pub async fn stats(conn: &Connection, user_id: &str) -> Result<ContactStats> {
        let mut rows = conn
            .query(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(AVG(health_score), 0.0),
                    COALESCE(SUM(CASE WHEN health_score >= 75 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN health_score >= 50 AND health_score < 75 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN health_score < 50 THEN 1 ELSE 0 END), 0)
                FROM contacts
                WHERE user_id = ?1
                "#,
                params![user_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(ContactStats::default());
        };

        Ok(ContactStats {
            total_contacts: row.get::<i64>(0)?.max(0) as u64,
            average_health_score: row.get::<f64>(1)?,
            thriving: row.get::<i64>(2)?.max(0) as u64,
            stable: row.get::<i64>(3)?.max(0) as u64,
            needs_attention: row.get::<i64>(4)?.max(0) as u64,
        })
    }

    fn row_to_contact(row: &libsql::Row) -> Result<Contact> {
        let created_at: String = row.get(20)?;
        let updated_at: String = row.get(21)?;

        Ok(Contact {
            id: row.get(0)?,
            user_id: row.get(1)?,
            email: row.get(2)?,
            display_name: row.get(3)?,
            health_score: row.get(4)?,
            emails_sent: row.get(5)?,
            emails_received: row.get(6)?,
            total_emails: row.get(7)?,
            last_contact_at: row
                .get::<Option<String>>(8)?
                .as_deref()
                .and_then(parse_timestamp),
            recency_score: row.get(9)?,
            response_score: row.get(10)?,
            initiation_score: row.get(11)?,
            sentiment_score: row.get(12)?,
            commitment_score: row.get(13)?,
            avg_sentiment: row.get(14)?,
            avg_response_time_minutes: row.get::<Option<f64>>(15)?,
            commitments_made: row.get(16)?,
            commitments_kept: row.get(17)?,
            sentiment_trend: row
                .get::<String>(18)?
                .parse()
                .unwrap_or(SentimentTrend::Stable),
            suggested_action: row.get(19)?,
            created_at: parse_timestamp(&created_at).unwrap_or_else(Utc::now),
            updated_at: parse_timestamp(&updated_at).unwrap_or_else(Utc::now),
        })
    }
}
