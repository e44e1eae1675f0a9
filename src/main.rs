//! DevX Assistant server binary.
//!
//! Loads configuration, wires the store and provider adapters, and serves
//! the chat API.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use devx_assistant::adapters::ai::{OpenAIConfig, OpenAIProvider};
use devx_assistant::adapters::http::chat::{chat_router, ChatAppState};
use devx_assistant::adapters::postgres::{PostgresChatStore, PostgresUsageLedger};
use devx_assistant::adapters::storage::{InMemoryChatStore, InMemoryUsageLedger};
use devx_assistant::application::handlers::chat::{
    ListConversationsHandler, SendMessageHandler,
};
use devx_assistant::application::AssistantService;
use devx_assistant::config::AppConfig;
use devx_assistant::ports::{AIProvider, ChatStore, UsageLedger};

#[tokio::main]
async fn main() {
    let config = AppConfig::load().expect("Failed to load configuration");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate().expect("Invalid configuration");

    if !config.ai.has_api_key() {
        tracing::error!(
            "OpenAI API key is not set; chat requests will fail until \
             DEVX__AI__OPENAI_API_KEY is configured"
        );
    }

    let provider: Arc<dyn AIProvider> = Arc::new(OpenAIProvider::new(
        OpenAIConfig::from_app_config(&config.ai),
    ));
    let assistant = AssistantService::from_config(provider, &config.ai);

    let (store, ledger): (Arc<dyn ChatStore>, Arc<dyn UsageLedger>) =
        match config.database.url {
            Some(ref url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .acquire_timeout(config.database.acquire_timeout())
                    .connect(url)
                    .await
                    .expect("Failed to connect to database");

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .expect("Failed to run migrations");

                tracing::info!("Using PostgreSQL store");
                (
                    Arc::new(PostgresChatStore::new(pool.clone())),
                    Arc::new(PostgresUsageLedger::new(pool)),
                )
            }
            None => {
                tracing::warn!("No database configured, using in-memory store");
                (
                    Arc::new(InMemoryChatStore::new()),
                    Arc::new(InMemoryUsageLedger::new()),
                )
            }
        };

    let state = ChatAppState::new(
        Arc::new(SendMessageHandler::new(
            store.clone(),
            ledger,
            assistant,
        )),
        Arc::new(ListConversationsHandler::new(store)),
    );

    let app = chat_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config
        .server
        .socket_addr()
        .expect("Invalid server address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    tracing::info!("DevX Assistant listening on {}", addr);
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
