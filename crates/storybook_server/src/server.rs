//! Process wiring: build every backend from [`AppConfig`] and serve.

use crate::{AppConfig, AppState, JwksVerifier, router};
use std::sync::Arc;
use storybook_core::Provider;
use storybook_database::{PgStoryStore, establish_pool, run_migrations};
use storybook_error::{ConfigError, StorybookResult};
use storybook_generator::Services;
use storybook_interface::{ImageOracle, StoryOracle, StoryStore, UsageLedger};
use storybook_models::{ChatCompletionsOracle, ImageGenerationClient, ModelCatalog};
use storybook_storage::{FileSystemStorage, MediaStorage};
use tokio::net::TcpListener;
use tracing::instrument;

/// Connect to PostgreSQL, apply migrations and construct every client.
#[instrument(skip(config))]
pub fn build_state(config: &AppConfig) -> StorybookResult<AppState> {
    if config.auth.clerk_domain.trim().is_empty() && config.auth.jwks_url.is_none() {
        return Err(ConfigError::new("auth.clerk_domain is required").into());
    }

    let pool = establish_pool(&config.database.url, config.database.pool_size)?;
    run_migrations(&pool)?;
    let postgres = PgStoryStore::new(pool);
    let store: Arc<dyn StoryStore> = Arc::new(postgres.clone());
    let ledger: Arc<dyn UsageLedger> = Arc::new(postgres);

    let catalog = ModelCatalog::default();
    let mut chat = ChatCompletionsOracle::new(catalog.clone())
        .with_endpoint(Provider::OpenAi, config.oracle.openai.endpoint());
    if let Some(google) = &config.oracle.google {
        chat = chat.with_endpoint(Provider::Google, google.endpoint());
    }
    if let Some(claude) = &config.oracle.claude {
        chat = chat.with_endpoint(Provider::Claude, claude.endpoint());
    }
    let oracle: Arc<dyn StoryOracle> = Arc::new(chat);

    let media: Arc<dyn MediaStorage> = Arc::new(FileSystemStorage::new(
        &config.storage.root,
        &config.storage.public_base_url,
    )?);
    let images: Arc<dyn ImageOracle> = Arc::new(ImageGenerationClient::new(
        config.image.endpoint(),
        catalog,
        media,
    ));

    let services = Services::new(store, ledger, oracle, images, config.models.clone());
    let verifier = Arc::new(JwksVerifier::new(&config.auth));
    tracing::info!(issuer = %config.auth.issuer(), "Server state built");
    Ok(AppState::new(services, verifier))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: AppConfig) -> StorybookResult<()> {
    let state = tokio::task::block_in_place(|| build_state(&config))?;
    let app = router(state);

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ConfigError::new(format!("Failed to bind {}: {}", address, e)))?;
    tracing::info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConfigError::new(format!("Server error: {}", e)))?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
