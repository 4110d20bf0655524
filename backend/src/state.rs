use crate::config::AppConfig;
use crate::db::DbPool;
use crate::knowledge::KnowledgeBase;
use std::sync::Arc;

/// Shared by every handler. Nothing in here changes after startup; the
/// store does its own locking.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub knowledge: Arc<KnowledgeBase>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig, knowledge: KnowledgeBase) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.weather_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client ({}), using defaults", e);
                reqwest::Client::new()
            });

        Self {
            pool,
            config: Arc::new(config),
            knowledge: Arc::new(knowledge),
            http,
        }
    }
}
