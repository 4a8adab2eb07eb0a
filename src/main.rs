use std::path::PathBuf;

use axum::http::Request;
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Level;

use portfolio::{router, AppState, Settings};

/// Portfolio site server with draft preview.
#[derive(Parser, Debug)]
#[command(name = "portfolio")]
#[command(about = "Serves the portfolio site from a headless content store", long_about = None)]
struct Args {
    /// Path to the TOML settings file (optional; missing files are ignored).
    #[arg(long, env = "PORTFOLIO_CONFIG", default_value = "portfolio.toml")]
    config: PathBuf,

    /// Override `server.bind_addr`.
    #[arg(long)]
    bind: Option<String>,

    /// Serve the embedded demo content instead of querying Sanity.
    #[arg(long)]
    demo: bool,

    /// Render every published page into the cache before serving.
    #[arg(long)]
    prerender: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting portfolio server...");

    // Load configuration
    let mut settings = Settings::load(Some(&args.config))?;
    if let Some(bind) = args.bind {
        settings.server.bind_addr = bind;
    }
    if args.demo {
        settings.demo_mode = true;
    }
    settings.validate()?;

    let bind_addr = settings.server.bind_addr.clone();

    // Build application state
    let state = AppState::from_settings(settings)?;

    if args.prerender {
        portfolio::pages::routes::prerender(&state).await;
    }

    // Build router with middleware
    let app = router(state).layer(ServiceBuilder::new().layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }),
    ));

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
