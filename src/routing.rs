//! Application router configuration.

use axum::{Router, response::Redirect, routing::get};

use crate::{
    AppState, endpoints,
    internal_server_error::get_internal_server_error_page,
    job_title::get_job_titles_page,
    monitoring::{
        get_monitoring_page, get_page_fragment, get_period_fragment, get_search_fragment,
        get_table_fragment,
    },
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::MONITORING_VIEW, get(get_monitoring_page))
        .route(endpoints::MONITORING_PERIOD, get(get_period_fragment))
        .route(endpoints::MONITORING_SEARCH, get(get_search_fragment))
        .route(endpoints::MONITORING_PAGE, get(get_page_fragment))
        .route(endpoints::MONITORING_TABLE, get(get_table_fragment))
        .route(endpoints::JOB_TITLES_VIEW, get(get_job_titles_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the monitoring page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::MONITORING_VIEW)
}
