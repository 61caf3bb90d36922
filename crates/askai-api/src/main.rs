use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use askai_api::{
    build_router, config::Config, state::AppState, validation::PromptValidator, AskService,
};
use askai_llm::ClientFactory;
use askai_persist::{ConversationStore, StoreBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting AskAI API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let openai = config.openai();
    if !openai.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set; /api/ask-ai will answer 500 until it is");
    }

    tracing::info!("Initializing LLM client for model {}", config.llm.model);
    let chat_client = ClientFactory::create_chat_client(&openai)?;

    tracing::info!("Opening conversation store at {}", config.database.path);
    let store = Arc::new(
        StoreBuilder::new()
            .path(&config.database.path)
            .max_connections(config.database.max_connections)
            .build()
            .await?,
    );
    tracing::info!("Conversation store ready");

    let service = AskService::new(
        chat_client,
        store.clone(),
        PromptValidator::from_config(&config.validation),
        config.llm.clone(),
        openai.is_configured(),
    );

    let state = Arc::new(AppState::new(config.clone(), store.clone(), service));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/api/health", addr);
    tracing::info!("API docs: http://{}/api/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, {} conversations on record", store.count().await.unwrap_or(0));
    store.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
