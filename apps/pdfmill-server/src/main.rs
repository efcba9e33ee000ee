//! pdfmill server
//!
//! Backend for the pdfmill web PDF toolbox. Every transformation is one
//! route: upload via multipart, run the operation from pdfmill-core, write
//! the result to the output directory, answer with the filename for a later
//! download. Provides:
//!
//! - Merge, split, compress, rotate, extract, watermark
//! - Images-to-PDF conversion (and the pdf-to-images stub)
//! - Result download and health check
//! - Optional static serving of a built frontend

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod storage;

use storage::Storage;

/// Upload bodies larger than this are rejected outright.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Command-line arguments for the pdfmill server
#[derive(Parser, Debug)]
#[command(name = "pdfmill-server")]
#[command(about = "pdfmill backend - upload, transform, and download PDFs")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Directory where transformation results are written
    #[arg(long, default_value = "uploads")]
    output_dir: PathBuf,

    /// Directory with the built frontend, served as static files when set
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storage = Storage::new(&args.output_dir)?;
    let state = AppState { storage };

    // Rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .expect("Failed to create rate limiter config"),
    );

    // CORS for the web client
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let mut app = Router::new()
        // Health check
        .route("/api/health", get(api::handle_health))
        // Transformations
        .route("/api/merge", post(api::handle_merge))
        .route("/api/split", post(api::handle_split))
        .route("/api/compress", post(api::handle_compress))
        .route("/api/rotate", post(api::handle_rotate))
        .route("/api/extract", post(api::handle_extract))
        .route("/api/watermark", post(api::handle_watermark))
        .route("/api/protect", post(api::handle_protect))
        .route("/api/pdf-to-images", post(api::handle_pdf_to_images))
        .route("/api/images-to-pdf", post(api::handle_images_to_pdf))
        // Result delivery
        .route("/api/download/:filename", get(api::handle_download))
        // Apply middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    if let Some(static_dir) = &args.static_dir {
        if static_dir.is_dir() {
            info!("Serving static files from {}", static_dir.display());
            app = app.fallback_service(ServeDir::new(static_dir));
        }
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("pdfmill listening on http://{}", addr);
    info!("Output directory: {}", args.output_dir.display());
    info!("Rate limit: {} requests/second per IP", args.rate_limit);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, closing");
}
