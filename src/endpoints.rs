//! The console's route URIs and the backend API paths it consumes.
//!
//! For endpoints that take a parameter, e.g., '/api/users/{user_id}', use [format_endpoint].

/// The root route which redirects to the monitoring page.
pub const ROOT: &str = "/";
/// The page for monitoring partner income against the period limit.
pub const MONITORING_VIEW: &str = "/transaksi";
/// The fragment that changes the selected period and fetches its aggregates.
pub const MONITORING_PERIOD: &str = "/transaksi/periode";
/// The fragment that applies the local search text and row order.
pub const MONITORING_SEARCH: &str = "/transaksi/cari";
/// The fragment that changes the displayed page of the monitoring table.
pub const MONITORING_PAGE: &str = "/transaksi/halaman";
/// The fragment that re-renders the monitoring table from the current screen state.
pub const MONITORING_TABLE: &str = "/transaksi/tabel";
/// The page listing the job-title reference data.
pub const JOB_TITLES_VIEW: &str = "/jabatan";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// Backend path for per-partner income aggregates of a period.
pub const BACKEND_TRANSACTIONS: &str = "api/transaksi";
/// Backend path for the job-title reference data.
pub const BACKEND_JOB_TITLES: &str = "api/jabatan";
/// Backend path for a single user account.
pub const BACKEND_USER: &str = "api/users/{user_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
