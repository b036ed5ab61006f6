//! Parkwatch API Server - Backend for resident parking-violation reports
//!
//! Provides REST endpoints for:
//! - Plate ownership checks against the registered vehicle roster
//! - Violation report submission, at most one per plate per reporter per day
//! - Paginated violation history with reporter and owner context
//! - Reporter-scoped deletion
//!
//! Authentication is handled by the fronting gateway, which forwards the
//! resident identity in a header (see `identity`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod gate;
mod handlers;
mod identity;
mod ledger;
mod matcher;
mod models;
mod photos;
mod state;

use state::AppState;

/// Command-line arguments for the parkwatch server
#[derive(Parser, Debug)]
#[command(name = "parkwatch-api")]
#[command(about = "Community parking-violation reporting service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Directory violation photos are stored in
    #[arg(long, default_value = "uploads")]
    uploads_dir: PathBuf,

    /// JSON seed file with residents and owner vehicles, loaded into empty tables
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Request bodies carry base64 photos; a 5 MiB photo inflates to roughly
/// 6.7 MiB encoded, so leave headroom beyond that.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Build the router. Shared with the test harness.
pub fn app(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Vehicle roster
        .route("/api/vehicles/check/:plate", get(handlers::check_vehicle))
        .route("/api/vehicles/owners", get(handlers::list_owner_vehicles))
        // Violation reports
        .route("/api/violations/report", post(handlers::submit_report))
        .route("/api/violations/list", get(handlers::list_reports))
        .route("/api/violations/:id", delete(handlers::delete_report))
        // Stored photos
        .nest_service("/uploads", ServeDir::new(state.photos.root().to_path_buf()))
        // Apply middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let app_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("parkwatch_api={}", app_level).parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:parkwatch.db?mode=rwc".to_string());

    // Initialize application state
    info!("Initializing parkwatch API...");
    let state = AppState::new(&database_url, &args.uploads_dir).await?;
    let state = Arc::new(state);

    if let Some(seed) = &args.seed {
        state.seed_from_file(seed).await?;
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Parkwatch API listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
