use std::{fmt, sync::Arc};

use reqwest::{
    StatusCode, Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::Error;

use super::{CredentialProvider, FetchError};

/// A handle to the backend API, cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    base_url: Url,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a client for the backend at `base_url`, e.g. "http://localhost:8000".
    ///
    /// Backend paths are resolved relative to `base_url`, so a base URL with a
    /// path prefix such as "https://example.go.id/honor" keeps its prefix.
    ///
    /// # Errors
    /// Returns [Error::InvalidBackendUrl] if `base_url` is not an absolute URL,
    /// or [Error::HttpClientError] if the HTTP client cannot be set up.
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Result<Self, Error> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };

        let parsed = Url::parse(&normalized)
            .inspect_err(|error| tracing::error!("could not parse backend URL {base_url}: {error}"))
            .map_err(|_| Error::InvalidBackendUrl(base_url.to_owned()))?;

        if parsed.cannot_be_a_base() {
            tracing::error!("backend URL {base_url} cannot be used as a base URL");
            return Err(Error::InvalidBackendUrl(base_url.to_owned()));
        }

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .inspect_err(|error| tracing::error!("could not build the HTTP client: {error}"))
            .map_err(|error| Error::HttpClientError(error.to_string()))?;

        Ok(Self {
            base_url: parsed,
            http,
            credentials,
        })
    }

    /// Send a GET request to `path` with `query` parameters and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.url(path)?;
        tracing::debug!("GET {url} {query:?}");

        let response = self
            .http
            .get(url.clone())
            .headers(self.auth_headers()?)
            .query(query)
            .send()
            .await
            .inspect_err(|error| tracing::error!("GET {url} failed: {error}"))
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        let response = check_status(response, &url)?;

        response
            .json::<T>()
            .await
            .inspect_err(|error| tracing::error!("could not decode response from {url}: {error}"))
            .map_err(|error| FetchError::Decode(error.to_string()))
    }

    /// Send `body` as JSON with a PUT request to `path`, ignoring the response body.
    pub(crate) async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), FetchError> {
        let url = self.url(path)?;
        tracing::debug!("PUT {url}");

        let response = self
            .http
            .put(url.clone())
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .inspect_err(|error| tracing::error!("PUT {url} failed: {error}"))
            .map_err(|error| FetchError::Transport(error.to_string()))?;

        check_status(response, &url).map(|_| ())
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| FetchError::InvalidUrl(format!("{path}: {error}")))
    }

    fn auth_headers(&self) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = self.credentials.bearer_token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|error| FetchError::InvalidUrl(format!("invalid auth header: {error}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

fn check_status(response: reqwest::Response, url: &Url) -> Result<reqwest::Response, FetchError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("backend rejected the credential for {url}");
        return Err(FetchError::SessionExpired);
    }

    if !status.is_success() {
        tracing::error!("backend responded to {url} with status {status}");
        return Err(FetchError::Status(status.as_u16()));
    }

    Ok(response)
}
