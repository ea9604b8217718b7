use cyclewatch::config::Config;
use cyclewatch::services::{ProfileRegistry, RefreshService, SeriesCache, SqliteStore};
use cyclewatch::sources::YahooFinanceClient;
use cyclewatch::{api, AppState};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cyclewatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting cyclewatch on {}:{}", config.host, config.port);

    let profiles = Arc::new(ProfileRegistry::default_treasury().retain_symbols(&config.symbols)?);
    info!("Tracking {}", profiles.symbols().join(", "));

    let store = Arc::new(SqliteStore::new(&config.database_path)?);
    let cache = Arc::new(SeriesCache::new(Duration::from_secs(
        config.series_cache_ttl_secs,
    )));

    let refresher = Arc::new(RefreshService::new(
        config.clone(),
        store.clone(),
        profiles.clone(),
        cache.clone(),
        YahooFinanceClient::new()?,
    ));

    if !config.refresh_on_startup {
        info!("Startup refresh disabled; first refresh after one interval");
    }
    refresher.clone().start_polling(config.refresh_on_startup);

    let state = AppState {
        config: config.clone(),
        store,
        profiles,
        cache,
        refresher,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("cyclewatch listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
