//! Route handlers for the monitoring page and the fragments htmx swaps into it.
//!
//! The viewer's screen lives in the [ScreenRegistry] and is found through the
//! `monitoring_screen` cookie. Full page loads open a screen if needed,
//! fragments expect one to exist and send the browser back to the full page
//! when it has gone away, e.g. after sitting idle.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_htmx::{HxCurrentUrl, HxPushUrl, HxRedirect};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, endpoints, pagination::PaginationConfig, timezone::current_local_year,
};

use super::{
    period::{QueryPeriod, YearRange},
    screen::{ApplyOutcome, RowOrder},
    session::{MonitoringSession, ScreenId, ScreenRegistry},
    view::{monitoring_table, monitoring_view, period_url},
};

/// The cookie that holds the id of the viewer's monitoring screen.
pub(crate) const SCREEN_COOKIE: &str = "monitoring_screen";

/// The state needed for the monitoring page.
#[derive(Debug, Clone)]
pub struct MonitoringPageState {
    /// The open monitoring screens.
    screens: Arc<ScreenRegistry>,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Jakarta".
    local_timezone: String,
    /// The config that controls how to display pages of data.
    pagination_config: PaginationConfig,
}

impl FromRef<AppState> for MonitoringPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            screens: state.screens.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters of the full monitoring page.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MonitoringQuery {
    tahun: Option<i32>,
    bulan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    urut: Option<RowOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    halaman: Option<u64>,
}

/// The query parameters of a period change.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    tahun: i32,
    bulan: String,
}

/// The query parameters of a search or order change.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    urut: Option<RowOrder>,
}

/// The query parameters of a page change.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    halaman: u64,
}

enum QueryDecision {
    Redirect(String),
    Period(QueryPeriod),
}

/// Fill in the current year and the whole year for a request that did not
/// name a period, so that every monitoring URL can be shared as is.
fn normalize_query(query: &MonitoringQuery, years: &YearRange) -> Result<QueryDecision, Error> {
    match (query.tahun, query.bulan.as_deref()) {
        (Some(year), Some(month)) => Ok(QueryDecision::Period(QueryPeriod::parse(
            year, month, years,
        )?)),
        (year, month) => {
            let canonical = MonitoringQuery {
                tahun: Some(year.unwrap_or(years.current_year())),
                bulan: Some(month.unwrap_or("all").to_owned()),
                q: query.q.clone(),
                urut: query.urut,
                halaman: query.halaman,
            };
            let query_string = serde_urlencoded::to_string(&canonical)
                .inspect_err(|error| tracing::error!("could not encode monitoring query: {error}"))
                .unwrap_or_default();

            Ok(QueryDecision::Redirect(format!(
                "{}?{query_string}",
                endpoints::MONITORING_VIEW
            )))
        }
    }
}

fn screen_id(jar: &CookieJar) -> Option<ScreenId> {
    jar.get(SCREEN_COOKIE)
        .and_then(|cookie| ScreenId::parse(cookie.value()))
}

fn screen_cookie(id: ScreenId) -> Cookie<'static> {
    Cookie::build((SCREEN_COOKIE, id.to_string()))
        .path(endpoints::ROOT)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Close the viewer's monitoring screen, e.g. when they open another page.
pub(crate) fn close_viewer_screen(screens: &ScreenRegistry, jar: &CookieJar) {
    if let Some(id) = screen_id(jar) {
        if let Err(error) = screens.close(id) {
            tracing::error!("could not close monitoring screen {id}: {error}");
        }
    }
}

fn log_outcome(outcome: ApplyOutcome, period: QueryPeriod) {
    match outcome {
        ApplyOutcome::Applied => tracing::debug!("loaded monitoring data for {period}"),
        ApplyOutcome::Failed => tracing::debug!("monitoring data for {period} failed to load"),
        ApplyOutcome::Superseded | ApplyOutcome::Closed => {
            tracing::debug!("monitoring data for {period} was discarded ({outcome:?})")
        }
    }
}

/// Render the monitoring page for the period in the query.
///
/// Loading the page always fetches the period again, so a reload shows fresh data.
pub async fn get_monitoring_page(
    State(state): State<MonitoringPageState>,
    jar: CookieJar,
    Query(query): Query<MonitoringQuery>,
) -> Result<Response, Error> {
    let years = YearRange::around(current_local_year(&state.local_timezone)?);
    let period = match normalize_query(&query, &years)? {
        QueryDecision::Period(period) => period,
        QueryDecision::Redirect(redirect_url) => {
            return Ok(Redirect::to(&redirect_url).into_response());
        }
    };
    let page_size = state.pagination_config.default_page_size;

    let (id, session, _) = state.screens.open(screen_id(&jar), period)?;

    session.with_screen(|screen| {
        if let Some(q) = &query.q {
            screen.set_query(q);
        }
        if let Some(order) = query.urut {
            screen.set_order(order);
        }
    })?;

    let outcome = session.change_period(period).await?;
    log_outcome(outcome, period);

    let view = session.with_screen(|screen| {
        if let Some(page) = query.halaman {
            screen.request_page(page, page_size);
        }
        screen.project(page_size)
    })?;

    Ok((
        jar.add(screen_cookie(id)),
        monitoring_view(&view, &years, state.pagination_config.max_pages),
    )
        .into_response())
}

/// Switch the viewer's screen to another period and render the table once it has loaded.
pub async fn get_period_fragment(
    State(state): State<MonitoringPageState>,
    jar: CookieJar,
    Query(query): Query<PeriodQuery>,
) -> Response {
    change_period(state, jar, query)
        .await
        .unwrap_or_else(Error::into_alert_response)
}

async fn change_period(
    state: MonitoringPageState,
    jar: CookieJar,
    query: PeriodQuery,
) -> Result<Response, Error> {
    let years = YearRange::around(current_local_year(&state.local_timezone)?);
    let period = QueryPeriod::parse(query.tahun, &query.bulan, &years)?;

    let (id, session, _) = state.screens.open(screen_id(&jar), period)?;
    let outcome = session.change_period(period).await?;
    log_outcome(outcome, period);

    let response = render_table(&session, &state.pagination_config)?;

    Ok((
        HxPushUrl(period_url(endpoints::MONITORING_VIEW, period)),
        jar.add(screen_cookie(id)),
        response,
    )
        .into_response())
}

/// Apply a new search query or row order and render the table. Nothing is fetched.
pub async fn get_search_fragment(
    State(state): State<MonitoringPageState>,
    jar: CookieJar,
    HxCurrentUrl(current_url): HxCurrentUrl,
    Query(query): Query<SearchQuery>,
) -> Response {
    with_existing_session(&state, &jar, current_url, |session| {
        session.with_screen(|screen| {
            screen.set_query(&query.q);
            if let Some(order) = query.urut {
                screen.set_order(order);
            }
        })?;

        render_table(session, &state.pagination_config)
    })
}

/// Go to another page of the table.
pub async fn get_page_fragment(
    State(state): State<MonitoringPageState>,
    jar: CookieJar,
    HxCurrentUrl(current_url): HxCurrentUrl,
    Query(query): Query<PageQuery>,
) -> Response {
    let page_size = state.pagination_config.default_page_size;

    with_existing_session(&state, &jar, current_url, |session| {
        session.with_screen(|screen| screen.request_page(query.halaman, page_size))?;

        render_table(session, &state.pagination_config)
    })
}

/// Render the table as it is now, used to poll while a fetch is outstanding.
pub async fn get_table_fragment(
    State(state): State<MonitoringPageState>,
    jar: CookieJar,
    HxCurrentUrl(current_url): HxCurrentUrl,
) -> Response {
    with_existing_session(&state, &jar, current_url, |session| {
        render_table(session, &state.pagination_config)
    })
}

/// The monitoring page URL to reload into, keeping the period the viewer was looking at.
///
/// Only the path and query of the viewer's current URL are used, and only when
/// it is the monitoring page.
fn reload_url(current_url: Option<Uri>) -> String {
    current_url
        .as_ref()
        .filter(|url| url.path() == endpoints::MONITORING_VIEW)
        .and_then(Uri::path_and_query)
        .map_or_else(
            || endpoints::MONITORING_VIEW.to_owned(),
            |path_and_query| path_and_query.to_string(),
        )
}

fn with_existing_session(
    state: &MonitoringPageState,
    jar: &CookieJar,
    current_url: Option<Uri>,
    render: impl FnOnce(&MonitoringSession) -> Result<Response, Error>,
) -> Response {
    let session = match screen_id(jar).map(|id| state.screens.get(id)).transpose() {
        Ok(Some(Some(session))) => session,
        Ok(_) => {
            tracing::debug!("no open monitoring screen, reloading the monitoring page");
            return (HxRedirect(reload_url(current_url)), StatusCode::OK).into_response();
        }
        Err(error) => return error.into_alert_response(),
    };

    render(session.as_ref()).unwrap_or_else(Error::into_alert_response)
}

fn render_table(
    session: &MonitoringSession,
    pagination_config: &PaginationConfig,
) -> Result<Response, Error> {
    let view = session.with_screen(|screen| screen.project(pagination_config.default_page_size))?;

    Ok(monitoring_table(&view, pagination_config.max_pages).into_response())
}
