use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Contacts: one row per (user, counterpart address)
        CREATE TABLE IF NOT EXISTS contacts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            email TEXT NOT NULL,
            display_name TEXT,
            health_score INTEGER NOT NULL DEFAULT 0,
            emails_sent INTEGER NOT NULL DEFAULT 0,
            emails_received INTEGER NOT NULL DEFAULT 0,
            total_emails INTEGER NOT NULL DEFAULT 0,
            last_contact_at TEXT,
            recency_score REAL NOT NULL DEFAULT 0,
            response_score REAL NOT NULL DEFAULT 0,
            initiation_score REAL NOT NULL DEFAULT 0,
            sentiment_score REAL NOT NULL DEFAULT 0,
            commitment_score REAL NOT NULL DEFAULT 0,
            avg_sentiment REAL NOT NULL DEFAULT 0,
            avg_response_time_minutes REAL,
            commitments_made INTEGER NOT NULL DEFAULT 0,
            commitments_kept INTEGER NOT NULL DEFAULT 0,
            sentiment_trend TEXT NOT NULL DEFAULT 'stable',
            suggested_action TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (user_id, email)
        );

        CREATE INDEX IF NOT EXISTS idx_contacts_user_health
            ON contacts(user_id, health_score DESC);

        -- Interactions: append-only ledger owned by a contact
        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,
            contact_id TEXT NOT NULL,
            email_id TEXT,
            direction TEXT NOT NULL,
            subject TEXT NOT NULL DEFAULT '',
            sent_at TEXT,
            received_at TEXT,
            sentiment REAL,
            sentiment_label TEXT,
            was_response INTEGER NOT NULL DEFAULT 0,
            response_time_minutes REAL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (contact_id) REFERENCES contacts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_contact_id ON interactions(contact_id);
        CREATE INDEX IF NOT EXISTS idx_interactions_email_id
            ON interactions(email_id) WHERE email_id IS NOT NULL;
        "#,
    )
    .await?;

    Ok(())
}
