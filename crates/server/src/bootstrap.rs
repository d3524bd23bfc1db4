use std::sync::Arc;

use axum::Router;
use careline_agent::{
    CompletionError, ConversationPipeline, HostedCompletionClient, ResponseGenerator,
};
use careline_core::config::{AppConfig, ConfigError, LoadOptions};
use careline_core::crypto::{CryptoError, FieldCipher};
use careline_db::repositories::{
    ConversationRepository, CustomerRepository, SqlConversationRepository, SqlCustomerRepository,
};
use careline_db::{connect, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::simulator::SocialSimulator;

/// Everything handlers need, constructed once at startup and injected
/// through axum state. No global singletons anywhere.
#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub db_pool: DbPool,
    pub customers: Arc<dyn CustomerRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub cipher: FieldCipher,
    pub pipeline: Arc<ConversationPipeline<HostedCompletionClient>>,
    pub simulator: Arc<SocialSimulator>,
}

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid encryption key: {0}")]
    Cipher(#[source] CryptoError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("completion client construction failed: {0}")]
    CompletionClient(#[source] CompletionError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        app_name = %config.app.name,
        environment = %config.app.environment,
        "starting application bootstrap"
    );

    // An unusable encryption key must stop the process before it ever
    // accepts traffic.
    let cipher =
        FieldCipher::new(&config.security.encryption_key).map_err(BootstrapError::Cipher)?;

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let customers: Arc<dyn CustomerRepository> =
        Arc::new(SqlCustomerRepository::new(db_pool.clone()));
    let conversations: Arc<dyn ConversationRepository> =
        Arc::new(SqlConversationRepository::new(db_pool.clone()));

    let completion_client =
        HostedCompletionClient::new(&config.llm).map_err(BootstrapError::CompletionClient)?;
    let pipeline = Arc::new(ConversationPipeline::new(
        customers.clone(),
        conversations.clone(),
        ResponseGenerator::new(completion_client),
        cipher.clone(),
    ));

    let state = AppState {
        app_name: config.app.name.clone(),
        db_pool,
        customers,
        conversations,
        cipher,
        pipeline,
        simulator: Arc::new(SocialSimulator::default()),
    };

    Ok(Application { config, state })
}

/// The complete route surface: banner/health, customer records, the chat
/// pipeline, conversation history, and the demo simulator.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(crate::health::router())
        .merge(crate::customers::router())
        .merge(crate::chat::router())
        .merge(crate::demo::router())
        .with_state(state)
}
