use std::{fs::OpenOptions, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use mitra_console::{
    AppState, BackendClient, PaginationConfig, StaticToken, build_router, graceful_shutdown,
};

/// The web console for monitoring Mitra honorarium data.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the honorarium backend, e.g. "http://localhost:8000".
    #[arg(long, env = "MITRA_BACKEND_URL")]
    backend_url: String,

    /// Bearer token sent with every backend request.
    #[arg(long, env = "MITRA_BACKEND_TOKEN", hide_env_values = true)]
    backend_token: Option<String>,

    /// The port to serve the console from.
    #[arg(short, long, env = "MITRA_PORT", default_value_t = 3000)]
    port: u16,

    /// The office's timezone as a canonical timezone name.
    #[arg(long, env = "MITRA_TIMEZONE", default_value = "Asia/Jakarta")]
    timezone: String,

    /// The number of rows shown per page.
    #[arg(long, default_value_t = 10)]
    page_size: u64,

    /// Close monitoring screens that have not been used for this many minutes.
    #[arg(long, default_value_t = 30)]
    screen_idle_minutes: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let credentials = match args.backend_token {
        Some(token) => StaticToken::new(token),
        None => {
            tracing::warn!("No backend token set, requests will be sent without credentials");
            StaticToken::anonymous()
        }
    };
    let backend = BackendClient::new(&args.backend_url, Arc::new(credentials))
        .expect("Could not create the backend client");

    let pagination_config = PaginationConfig {
        default_page_size: args.page_size,
        ..Default::default()
    };
    let state = AppState::new(
        backend,
        &args.timezone,
        pagination_config,
        idle_timeout(args.screen_idle_minutes),
    )
    .expect("Could not create the app state");

    tokio::spawn(purge_idle_screens(state.clone()));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router
        .layer(axum::middleware::from_fn(mitra_console::logging_middleware))
        .layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly");
}

/// The idle timeout for monitoring screens, saturating for absurdly large values.
fn idle_timeout(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

/// Close idle monitoring screens once a minute.
async fn purge_idle_screens(state: AppState) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));

    loop {
        interval.tick().await;

        match state.screens.purge_idle() {
            Ok(0) => {}
            Ok(closed) => tracing::debug!(
                "Closed {closed} idle monitoring screens, {} still open",
                state.screens.len()
            ),
            Err(error) => tracing::error!("Could not close idle monitoring screens: {error}"),
        }
    }
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
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
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::idle_timeout;

    #[test]
    fn idle_timeout_is_in_minutes() {
        assert_eq!(idle_timeout(30), Duration::from_secs(1800));
    }

    #[test]
    fn huge_idle_timeout_saturates() {
        assert_eq!(idle_timeout(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
