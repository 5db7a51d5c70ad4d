use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Contact, ContactStats, Interaction};

/// Per-user contact records and their derived health fields.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn find_contact_by_email(&self, user_id: &str, email: &str) -> Result<Option<Contact>>;
    async fn get_contact_by_id(&self, user_id: &str, id: &str) -> Result<Option<Contact>>;

    /// Insert `contact`, or return the row already stored for the same
    /// `(user_id, email)`.
    async fn create_contact(&self, contact: &Contact) -> Result<Contact>;

    /// Overwrite every derived field of an existing contact.
    async fn update_contact(&self, contact: &Contact) -> Result<()>;

    /// Ordered by health score, then most recent contact.
    async fn list_contacts(&self, user_id: &str, limit: u32) -> Result<Vec<Contact>>;
    async fn get_contact_stats(&self, user_id: &str) -> Result<ContactStats>;
}

/// Append-only interaction ledger.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn create_interaction(&self, interaction: &Interaction) -> Result<()>;

    /// Most recent first. `None` returns the full history.
    async fn list_interactions_by_contact(
        &self,
        contact_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Interaction>>;
}

/// A complete database backend that combines all store traits plus lifecycle
/// operations.
#[async_trait]
pub trait DatabaseBackend: ContactStore + InteractionStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
