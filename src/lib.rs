//! Mitra console is an administrative web console for the honorarium data of
//! field partners ("Mitra") at a statistics office.
//!
//! The console owns no data. Everything is fetched from the honorarium
//! backend over REST and rendered as HTML pages and htmx fragments. The
//! centrepiece is the transaction monitoring screen, which checks each
//! partner's income for a period against the period's compliance limit.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod backend;
mod endpoints;
mod html;
mod internal_server_error;
mod job_title;
mod logging;
mod monitoring;
mod navigation;
mod not_found;
mod pagination;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use backend::{BackendClient, CredentialProvider, FetchError, StaticToken, UpdateUserRequest};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;

use crate::{
    alert::Alert,
    html::error_view,
    internal_server_error::{InternalServerError, render_internal_server_error},
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested year or month is not one the period selector offers.
    ///
    /// The string describes the rejected input, e.g. "year 1999".
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The configured backend base URL could not be parsed.
    #[error("invalid backend URL \"{0}\"")]
    InvalidBackendUrl(String),

    /// The HTTP client for the backend could not be set up, e.g. the TLS backend failed to load.
    #[error("could not create the HTTP client: {0}")]
    HttpClientError(String),

    /// A request to the honorarium backend failed.
    #[error("backend request failed: {0}")]
    Backend(#[from] FetchError),

    /// The task fetching a monitoring period stopped before returning a result.
    #[error("the monitoring fetch task did not finish")]
    FetchTaskError,

    /// Could not acquire the lock on a viewer's monitoring screen.
    #[error("could not acquire the screen lock")]
    ScreenLockError,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidPeriod(period) => (
                StatusCode::BAD_REQUEST,
                error_view(
                    "Periode Tidak Valid",
                    "400",
                    "Periode tidak valid",
                    &format!("Pilih tahun dan bulan dari daftar yang tersedia ({period})."),
                ),
            )
                .into_response(),
            Error::Backend(FetchError::SessionExpired) => (
                StatusCode::UNAUTHORIZED,
                error_view(
                    "Sesi Berakhir",
                    "401",
                    "Sesi Anda telah berakhir",
                    "Silakan masuk kembali untuk melanjutkan.",
                ),
            )
                .into_response(),
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerError {
                    description: "Pengaturan zona waktu tidak valid",
                    fix: &format!(
                        "Zona waktu \"{timezone}\" tidak dikenal. Periksa pengaturan server dan \
                    pastikan zona waktu berupa nama kanonis, misalnya \"Asia/Jakarta\"."
                    ),
                })
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for htmx requests.
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidPeriod(period) => Alert::Error {
                message: "Periode tidak valid".to_owned(),
                details: format!("Pilih tahun dan bulan dari daftar yang tersedia ({period})."),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::Backend(FetchError::SessionExpired) => Alert::Error {
                message: "Sesi berakhir".to_owned(),
                details: "Sesi Anda telah berakhir. Silakan masuk kembali.".to_owned(),
            }
            .into_response_with_status(StatusCode::UNAUTHORIZED),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::Error {
                    message: "Terjadi kesalahan".to_owned(),
                    details: "Terjadi kesalahan tak terduga, periksa log server untuk detailnya."
                        .to_owned(),
                }
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
