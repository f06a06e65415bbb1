//! Issue insights - analytics service for bug report dashboards

use anyhow::Context;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use issue_insights::config::{Config, LogFormat};
use issue_insights::routes;
use issue_insights::services::report_source::HttpReportSource;
use issue_insights::state::AppState;
use issue_insights::tasks::refresh;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "issue_insights=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    let lookup = config
        .client_lookup()
        .context("Failed to load client lookup table")?;

    let source = HttpReportSource::new(&config.report_url, config.report_timeout)
        .context("Failed to create report source")?;

    // Create application state
    let state = AppState::new(Arc::new(source), config.cache_ttl, lookup);

    // Spawn background tasks
    if let Some(every) = config.refresh_interval {
        let cache = Arc::clone(&state.cache);
        tokio::spawn(async move {
            refresh::refresh_task(cache, every).await;
        });
    }

    // Build router
    let app = routes::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    info!("Issue insights v{} starting on {}", env!("CARGO_PKG_VERSION"), config.listen_addr);
    info!("Report source: {}", config.report_url);
    info!("Cache TTL: {}s", config.cache_ttl.as_secs());
    info!("Clients mapped: {}", state.lookup.len());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
