mod caption;
mod config;
mod emotion;
mod errors;
mod meme;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::caption::FontLibrary;
use crate::config::Config;
use crate::emotion::Lexicon;
use crate::meme::{GiphyClient, ImageSearch, MemePipeline};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Meme API v{}", env!("CARGO_PKG_VERSION"));

    // Lexicon is required: a missing or malformed file aborts startup
    let lexicon = Arc::new(
        Lexicon::load(config.lexicon_path.as_deref()).context("Failed to load emotion lexicon")?,
    );

    // Image search (works without a key, falling back to stock GIFs)
    let giphy = GiphyClient::new(config.giphy_api_key.clone(), config.fetch_timeout)
        .context("Failed to build HTTP client")?;
    if !giphy.has_api_key() {
        tracing::warn!("GIPHY_API_KEY not set, every meme will use a fallback image");
    }
    let search: Arc<dyn ImageSearch> = Arc::new(giphy);

    // Font database scan is slow; do it once, off the async workers
    let font_dir = config.font_dir.clone();
    let fonts = tokio::task::spawn_blocking(move || FontLibrary::load(font_dir.as_deref()))
        .await
        .context("Font loading task failed")?;

    let pipeline = MemePipeline::new(lexicon.clone(), search, Arc::new(fonts));

    // Build app state
    let state = AppState {
        lexicon,
        pipeline: Arc::new(pipeline),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
