use std::{
    net::{IpAddr, SocketAddr},
    process::ExitCode,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use envelope_api::{AppState, PaginationConfig, build_router, graceful_shutdown};

/// The REST API server for envelope budgeting.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database, or `:memory:`.
    #[arg(long, env = "ENVELOPE_DB_PATH", default_value = "envelope.db")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "ENVELOPE_PORT", default_value_t = 8080)]
    port: u16,

    /// The address to listen on.
    #[arg(short, long, env = "ENVELOPE_ADDRESS", default_value = "127.0.0.1")]
    address: IpAddr,

    /// The number of items list endpoints return when no limit is given.
    /// A negative number means no limit.
    #[arg(long, env = "ENVELOPE_DEFAULT_LIMIT", default_value_t = 50, allow_negative_numbers = true)]
    default_limit: i64,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open the database at {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(
        connection,
        PaginationConfig {
            default_limit: args.default_limit,
        },
    ) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize the database: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));
    let addr = SocketAddr::new(args.address, args.port);

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted to responses.
        .on_failure(());

    router.layer(tracing_layer)
}
