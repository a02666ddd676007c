//! Implements a struct that holds the state of the web server.

use std::{sync::Arc, time::Duration};

use crate::{
    BackendClient, Error,
    monitoring::{HttpAggregateFetcher, ScreenRegistry},
    pagination::PaginationConfig,
    timezone::get_local_offset,
};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The client for the honorarium backend.
    pub backend: BackendClient,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    pub local_timezone: String,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// The open monitoring screens, one per viewer.
    pub screens: Arc<ScreenRegistry>,
}

impl AppState {
    /// Create a new [AppState] that talks to `backend`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Jakarta".
    /// Monitoring screens that go unused for `screen_idle_timeout` are closed.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a known timezone.
    pub fn new(
        backend: BackendClient,
        local_timezone: &str,
        pagination_config: PaginationConfig,
        screen_idle_timeout: Duration,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            tracing::error!("Invalid timezone {}", local_timezone);
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        let fetcher = Arc::new(HttpAggregateFetcher::new(backend.clone()));

        Ok(Self {
            backend,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            screens: Arc::new(ScreenRegistry::new(fetcher, screen_idle_timeout)),
        })
    }
}
