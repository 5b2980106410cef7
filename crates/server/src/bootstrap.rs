use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use tailorlink_assistant::conversation::{ConversationEngine, EngineSettings};
use tailorlink_core::config::{AppConfig, ConfigError, LoadOptions};
use tailorlink_store::{
    connect_with_settings, migrations, DbPool, DebouncedTranscriptWriter, SqlSessionRepository,
    SqlTranscriptRepository,
};

use crate::backend::{build_client, HttpOrderService, HttpTailorDirectory};
use crate::chat::ChatService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat: Arc<ChatService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("backend http client initialization failed: {0}")]
    BackendClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let client = build_client(&config.backend).map_err(BootstrapError::BackendClient)?;
    let engine = ConversationEngine::new(
        EngineSettings::from_config(&config.chat),
        Arc::new(HttpOrderService::new(client.clone(), &config.backend)),
        Arc::new(HttpTailorDirectory::new(client, &config.backend)),
    );

    let transcripts = Arc::new(SqlTranscriptRepository::new(db_pool.clone()));
    let writer = Arc::new(DebouncedTranscriptWriter::new(
        transcripts.clone(),
        Duration::from_millis(config.chat.history_debounce_ms),
    ));
    let chat = ChatService::new(
        engine,
        Arc::new(SqlSessionRepository::new(db_pool.clone())),
        transcripts,
        writer,
    );

    Ok(Application { config, db_pool, chat })
}
