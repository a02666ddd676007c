//! Alert fragments for reporting problems and outcomes inside a page.
//!
//! Alerts are rendered inline, e.g. above the monitoring table when the
//! latest fetch failed, and as the whole response body for htmx requests
//! that could not be served.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// An alert message with a short headline and optional details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Something went wrong and the user should know about it.
    Error { message: String, details: String },
    /// Something is off but the page is still usable.
    Warning { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Error { message, details } => (
                "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400",
                message,
                details,
            ),
            Alert::Warning { message, details } => (
                "p-4 mb-4 text-sm text-yellow-800 rounded-lg bg-yellow-50 \
                dark:bg-gray-800 dark:text-yellow-300",
                message,
                details,
            ),
        };

        html!(
            div class=(container_style) role="alert"
            {
                span class="font-medium" { (message) }

                @if !details.is_empty() {
                    " " (details)
                }
            }
        )
    }

    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}
