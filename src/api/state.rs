//! Shared application state handed to every handler.

use crate::{
    config::AppConfig,
    config::database,
    errors::Result,
    services::{CacheHandle, LlmHandle},
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tracing::info;

/// Handles to the database, the reply cache and the language model.
pub struct AppState {
    /// Database connection pool.
    pub db: DatabaseConnection,
    /// Chat reply cache.
    pub cache: CacheHandle,
    /// Language model used by the chatbot.
    pub llm: LlmHandle,
    /// Loaded configuration.
    pub config: AppConfig,
}

/// State as stored in the router.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Connects every backing service described by `config` and prepares the schema.
    ///
    /// # Errors
    /// Returns an error if the database, Redis or the HTTP client cannot be set up.
    pub async fn connect(config: AppConfig) -> Result<SharedState> {
        let db = database::create_connection(&config.database.url).await?;
        database::create_tables(&db).await?;
        let cache = CacheHandle::from_url(config.chat.redis_url.as_deref()).await?;
        let llm = LlmHandle::from_config(&config.chat)?;
        info!("Application state initialized");
        Ok(Self::from_parts(db, cache, llm, config))
    }

    /// Builds state from already constructed parts.
    #[must_use]
    pub fn from_parts(
        db: DatabaseConnection,
        cache: CacheHandle,
        llm: LlmHandle,
        config: AppConfig,
    ) -> SharedState {
        Arc::new(Self {
            db,
            cache,
            llm,
            config,
        })
    }

    /// How long chat replies stay cached.
    #[must_use]
    pub const fn chat_ttl(&self) -> Duration {
        Duration::from_secs(self.config.chat.cache_ttl_secs)
    }
}
