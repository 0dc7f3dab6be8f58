use clap::Parser;
use datenzaepfchen::config::{CommitMode, ServerConfig};
use datenzaepfchen::{AppState, create_app};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory receiving uploads (overrides UPLOAD_DIR)
    #[arg(short, long)]
    upload_dir: Option<PathBuf>,

    /// Directory of static assets (overrides ASSETS_DIR)
    #[arg(short, long)]
    assets_dir: Option<PathBuf>,

    /// Move all files of a request only after every file was received
    #[arg(long)]
    atomic: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datenzaepfchen=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServerConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.upload_dir {
        config.upload_dir = dir;
    }
    if let Some(dir) = args.assets_dir {
        config.assets_dir = dir;
    }
    if args.atomic {
        config.commit_mode = CommitMode::Atomic;
    }

    info!(
        "Upload dir={}, assets={}, max body={}MB, commit mode={:?}",
        config.upload_dir.display(),
        config.assets_dir.display(),
        config.max_body_size / 1024 / 1024,
        config.commit_mode
    );

    let port = config.port;
    let state = AppState::from_config(config).await?;

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("{} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!("{} in {:?}", response.status(), latency);
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Datenzaepfchen http server listening on port {}.", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown...");
        },
    }
}
