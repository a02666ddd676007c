//! Updates to user accounts.

use serde::Serialize;

use crate::endpoints::{self, format_endpoint};

use super::{BackendClient, FetchError};

/// The fields sent when an administrator edits a user account.
///
/// `password` is only sent when it is `Some`; the backend keeps the current
/// password when the field is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateUserRequest {
    /// The user's display name.
    pub name: String,
    /// The name the user logs in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// A new password, or `None` to leave the password unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UpdateUserRequest {
    /// Set the password from a form input, where an empty input means "unchanged".
    pub fn with_password_input(mut self, input: &str) -> Self {
        self.password = (!input.is_empty()).then(|| input.to_owned());
        self
    }
}

impl BackendClient {
    /// Save `request` as the new details of the user with `user_id`.
    pub async fn update_user(
        &self,
        user_id: i64,
        request: &UpdateUserRequest,
    ) -> Result<(), FetchError> {
        self.put_json(&format_endpoint(endpoints::BACKEND_USER, user_id), request)
            .await
            .inspect_err(|error| tracing::error!("could not update user {user_id}: {error}"))
    }
}
