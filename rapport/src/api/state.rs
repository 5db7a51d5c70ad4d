use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::intelligence::SentimentEstimator;
use crate::llm::LlmProvider;
use crate::services::RelationshipService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub llm: LlmProvider,
    pub relationships: RelationshipService,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn DatabaseBackend>, llm: LlmProvider) -> Self {
        let config = Arc::new(config);
        let sentiment = SentimentEstimator::new(
            llm.clone(),
            config.relationships.sentiment_timeout_secs,
        );
        let relationships =
            RelationshipService::new(db.clone(), sentiment, config.relationships.clone());

        Self {
            config,
            db,
            llm,
            relationships,
        }
    }
}

#[cfg(test)]
pub(crate) async fn test_state(api_keys: Vec<String>) -> AppState {
    use crate::config::{DatabaseConfig, RelationshipConfig, ServerConfig};

    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys,
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
            auth_token: None,
            local_path: None,
        },
        relationships: RelationshipConfig::default(),
        llm: None,
    };

    let raw_db = crate::db::Database::new(&config.database).await.unwrap();
    let db: Arc<dyn DatabaseBackend> = Arc::new(crate::db::LibSqlBackend::new(raw_db));
    let llm = LlmProvider::new(config.llm.as_ref());

    AppState::new(config, db, llm)
}
