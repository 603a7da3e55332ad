use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wine_options::{
    api, broadcast,
    label::{LabelConfig, MockLabelReader},
    state::AppState,
    types::GameConfig,
};

const DEFAULT_PORT: u16 = 6574;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wine_options=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Wine Options...");

    let game_config = GameConfig::from_env();

    // Initialize label recognition
    let label_config = LabelConfig::from_env();
    let label_reader = match label_config.build_reader() {
        Ok(reader) => {
            tracing::info!("Label reader initialized: {}", reader.name());
            reader
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize label reader: {}. Falling back to mock labels.",
                e
            );
            Arc::new(MockLabelReader::new(label_config.processing_delay))
        }
    };

    let state = Arc::new(AppState::new(game_config, label_reader));

    // Spawn background task for dropping abandoned sessions
    broadcast::spawn_session_reaper(state.clone());

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
