//! The credential the console presents to the backend.

use std::fmt;

/// Supplies the bearer token for backend requests.
///
/// Session handling lives outside the console, so the token is injected
/// rather than read from ambient storage.
pub trait CredentialProvider: Send + Sync {
    /// The token to send as `Authorization: Bearer <token>`, if any.
    fn bearer_token(&self) -> Option<String>;
}

/// A credential that never changes, e.g. a service token from the environment.
#[derive(Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Send `token` with every request.
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();

        if token.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(token))
        }
    }

    /// Send requests without an `Authorization` header.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("StaticToken(********)"),
            None => f.write_str("StaticToken(None)"),
        }
    }
}
