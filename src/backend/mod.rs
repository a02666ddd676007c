//! Client for the honorarium backend REST API.
//!
//! The backend owns all partner, job-title and user data. This module only
//! knows how to reach it: base URL handling, the bearer credential, status
//! mapping and JSON decoding. Screens build on top of [BackendClient].

mod client;
mod credentials;
mod user;

pub use client::BackendClient;
pub use credentials::{CredentialProvider, StaticToken};
pub use user::UpdateUserRequest;

/// The ways a request to the backend can fail.
///
/// Every non-2xx response is a failure. 401 is singled out on every screen
/// so the console can tell the user their session ended instead of showing
/// a generic error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend rejected the credential (HTTP 401).
    #[error("the backend session has expired")]
    SessionExpired,

    /// The backend answered with a non-success status other than 401.
    #[error("the backend responded with status {0}")]
    Status(u16),

    /// The request never got a response, e.g. connection refused.
    #[error("could not reach the backend: {0}")]
    Transport(String),

    /// The response body was not the JSON shape the console expects.
    #[error("could not decode the backend response: {0}")]
    Decode(String),

    /// A request URL could not be built from the base URL and path.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}
