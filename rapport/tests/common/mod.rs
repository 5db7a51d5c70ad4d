// Common test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde_json::json;
use tempfile::TempDir;

use rapport::config::{DatabaseConfig, LlmConfig, RelationshipConfig};
use rapport::db::{Database, DatabaseBackend, LibSqlBackend};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn database_config(url: String) -> DatabaseConfig {
    DatabaseConfig {
        url,
        auth_token: None,
        local_path: None,
    }
}

pub fn database_url(temp_dir: &TempDir) -> String {
    format!("file:{}", temp_dir.path().join("rapport_test.db").display())
}

/// File-backed database in a fresh temp dir. Keep the `TempDir` alive for
/// the duration of the test.
pub async fn test_backend() -> (Arc<dyn DatabaseBackend>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let backend = open_backend(&temp_dir).await;
    (backend, temp_dir)
}

pub async fn open_backend(temp_dir: &TempDir) -> Arc<dyn DatabaseBackend> {
    let db = Database::new(&database_config(database_url(temp_dir)))
        .await
        .expect("failed to open test database");
    Arc::new(LibSqlBackend::new(db))
}

pub fn llm_config(base_url: String) -> LlmConfig {
    LlmConfig {
        model: "openai/gpt-4o-mini".to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries: 0,
    }
}

pub fn relationship_config() -> RelationshipConfig {
    RelationshipConfig {
        sentiment_timeout_secs: 2,
        recent_interactions_limit: 5,
    }
}

pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}
