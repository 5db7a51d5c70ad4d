use crate::db::connection::Database;
use crate::db::repository::{ContactRepository, InteractionRepository};
use crate::db::traits::{ContactStore, DatabaseBackend, InteractionStore};
use crate::error::Result;
use crate::models::{Contact, ContactStats, Interaction};
use async_trait::async_trait;

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactStore for LibSqlBackend {
    async fn find_contact_by_email(&self, user_id: &str, email: &str) -> Result<Option<Contact>> {
        let conn = self.db.connect().await?;
        ContactRepository::find_by_email(&conn, user_id, email).await
    }
    async fn get_contact_by_id(&self, user_id: &str, id: &str) -> Result<Option<Contact>> {
        let conn = self.db.connect().await?;
        ContactRepository::get_by_id(&conn, user_id, id).await
    }
    async fn create_contact(&self, contact: &Contact) -> Result<Contact> {
        let conn = self.db.connect().await?;
        ContactRepository::create(&conn, contact).await
    }
    async fn update_contact(&self, contact: &Contact) -> Result<()> {
        let conn = self.db.connect().await?;
        ContactRepository::update(&conn, contact).await
    }
    async fn list_contacts(&self, user_id: &str, limit: u32) -> Result<Vec<Contact>> {
        let conn = self.db.connect().await?;
        ContactRepository::list(&conn, user_id, limit).await
    }
    async fn get_contact_stats(&self, user_id: &str) -> Result<ContactStats> {
        let conn = self.db.connect().await?;
        ContactRepository::stats(&conn, user_id).await
    }
}

#[async_trait]
impl InteractionStore for LibSqlBackend {
    async fn create_interaction(&self, interaction: &Interaction) -> Result<()> {
        let conn = self.db.connect().await?;
        InteractionRepository::create(&conn, interaction).await
    }
    async fn list_interactions_by_contact(
        &self,
        contact_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Interaction>> {
        let conn = self.db.connect().await?;
        InteractionRepository::list_by_contact(&conn, contact_id, limit).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
