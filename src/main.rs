use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_api::{
    article::ArticleService,
    config::ServerConfig,
    http::{router, routes::ROUTES, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();

    let filter_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("blog_api={filter_level},tower_http=info").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let service = Arc::new(ArticleService::new(&config.articles_dir));

    // the server still starts on an empty cache; POST /api/refresh retries
    let initial = Arc::clone(&service);
    match tokio::task::spawn_blocking(move || initial.refresh_cache()).await? {
        Ok(report) => info!("loaded {} articles", report.published),
        Err(e) => warn!("initial article scan failed: {e}"),
    }

    let app = router(AppState::new(service)).layer(config.cors_layer());

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;

    info!("blog api started on {}", bind_addr);
    info!("articles directory: {}", config.articles_dir.display());
    info!("CORS allowed origins: {:?}", config.allowed_origins());
    for (method, path, description) in ROUTES {
        info!("  {method:<5} {path:<40} {description}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
