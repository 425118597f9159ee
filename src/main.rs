use anyhow::{Context, Result};
use language_country_negotiation::{
    alias::InMemoryAliasStore,
    catalog::{CountryCatalog, JsonTermSource},
    config::Config,
    server::{self, AppState},
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("language_country_negotiation=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let source = JsonTermSource::new(&config.country_terms_file);
    let catalog = CountryCatalog::load(&source, &config.content_langcode);

    let aliases = match &config.path_aliases_file {
        Some(file) => InMemoryAliasStore::from_json_file(Path::new(file))
            .with_context(|| format!("Failed to load path aliases from {}", file))?,
        None => InMemoryAliasStore::default(),
    };
    info!("Loaded {} path aliases", aliases.len());

    let state = AppState::new(&config, catalog, Arc::new(aliases));
    let app = server::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
