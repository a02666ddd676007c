//! The job title list: reference data fetched from the backend, searched and paged locally.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, BackendClient,
    alert::Alert,
    backend::FetchError,
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    monitoring::{SCREEN_COOKIE, ScreenRegistry, close_viewer_screen},
    navigation::NavBar,
    pagination::{
        PageLinkTarget, PaginationConfig, create_pagination_indicators, paginate, pagination_view,
    },
};

/// A job title that can be assigned to partners.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobTitle {
    pub id: i64,
    #[serde(rename = "nama_jabatan")]
    pub name: String,
}

impl BackendClient {
    /// Fetch every job title.
    pub async fn job_titles(&self) -> Result<Vec<JobTitle>, FetchError> {
        self.get_json(endpoints::BACKEND_JOB_TITLES, &[]).await
    }
}

/// The job titles whose name contains `query`, ignoring case.
fn filter_job_titles<'a>(job_titles: &'a [JobTitle], query: &str) -> Vec<&'a JobTitle> {
    let needle = query.trim().to_lowercase();

    job_titles
        .iter()
        .filter(|job_title| needle.is_empty() || job_title.name.to_lowercase().contains(&needle))
        .collect()
}

/// The state needed for the job title page.
#[derive(Debug, Clone)]
pub struct JobTitlesPageState {
    backend: BackendClient,
    screens: Arc<ScreenRegistry>,
    pagination_config: PaginationConfig,
}

impl FromRef<AppState> for JobTitlesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            screens: state.screens.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters of the job title page.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JobTitlesQuery {
    #[serde(default)]
    q: String,
    halaman: Option<u64>,
}

/// Render the job title list.
///
/// Opening this page closes the viewer's monitoring screen. The list is
/// fetched fresh on every request, searching keeps the requested page and
/// clamps it to the pages that remain.
pub async fn get_job_titles_page(
    State(state): State<JobTitlesPageState>,
    jar: CookieJar,
    Query(query): Query<JobTitlesQuery>,
) -> Response {
    close_viewer_screen(&state.screens, &jar);
    let jar = jar.remove(Cookie::build(SCREEN_COOKIE).path(endpoints::ROOT));

    let job_titles = state
        .backend
        .job_titles()
        .await
        .inspect_err(|error| tracing::error!("could not get job titles: {error}"));

    let (status, content) = match job_titles {
        Ok(job_titles) => (
            StatusCode::OK,
            job_titles_list(&job_titles, &query, &state.pagination_config),
        ),
        Err(FetchError::SessionExpired) => (
            StatusCode::UNAUTHORIZED,
            Alert::Error {
                message: "Sesi berakhir.".to_owned(),
                details: "Silakan masuk kembali.".to_owned(),
            }
            .into_html(),
        ),
        Err(_) => (
            StatusCode::BAD_GATEWAY,
            Alert::Error {
                message: "Gagal memuat data jabatan.".to_owned(),
                details: "Coba muat ulang halaman ini.".to_owned(),
            }
            .into_html(),
        ),
    };

    (status, jar, job_titles_view(&query.q, &content)).into_response()
}

fn page_url(query: &str, page: u64) -> String {
    let query_string = serde_urlencoded::to_string(JobTitlesQuery {
        q: query.to_owned(),
        halaman: Some(page),
    })
    .inspect_err(|error| tracing::error!("could not encode job title query: {error}"))
    .unwrap_or_default();

    format!("{}?{query_string}", endpoints::JOB_TITLES_VIEW)
}

fn job_titles_list(
    job_titles: &[JobTitle],
    query: &JobTitlesQuery,
    pagination_config: &PaginationConfig,
) -> Markup {
    let matching = filter_job_titles(job_titles, &query.q);
    let page = paginate(
        &matching,
        pagination_config.default_page_size,
        query.halaman.unwrap_or(pagination_config.default_page),
    );
    let indicators = create_pagination_indicators(
        page.current_page,
        page.total_pages,
        pagination_config.max_pages,
    );

    html! {
        @if matching.is_empty() {
            p class="py-8 text-center" data-state="empty"
            {
                @if job_titles.is_empty() {
                    "Tidak ada data jabatan."
                } @else {
                    "Tidak ada jabatan yang cocok dengan \"" (query.q.trim()) "\"."
                }
            }
        } @else {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "No" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Nama Jabatan" }
                    }
                }

                tbody
                {
                    @for (offset, job_title) in page.items.iter().enumerate() {
                        tr class=(TABLE_ROW_STYLE) data-job-title-id=(job_title.id)
                        {
                            td class=(TABLE_CELL_STYLE) { (page.first_index + offset + 1) }
                            td class=(TABLE_CELL_STYLE) { (job_title.name) }
                        }
                    }
                }
            }
        }

        (pagination_view(
            &indicators,
            |page| page_url(&query.q, page),
            PageLinkTarget::Href,
        ))
    }
}

fn job_titles_view(query: &str, content: &Markup) -> Markup {
    let nav_bar = NavBar::new(endpoints::JOB_TITLES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-3xl"
            {
                h1 class="text-xl font-bold" { "Jabatan" }

                form method="get" action=(endpoints::JOB_TITLES_VIEW) class="flex gap-2 items-end"
                {
                    div class="grow"
                    {
                        label for="q" class=(FORM_LABEL_STYLE) { "Cari jabatan" }
                        input
                            id="q"
                            type="search"
                            name="q"
                            value=(query)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    button
                        type="submit"
                        class="px-4 py-2.5 text-sm font-medium text-white bg-blue-600 rounded hover:bg-blue-700"
                    {
                        "Cari"
                    }
                }

                (content)
            }
        }
    };

    base("Jabatan", &content)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{Json, Router, http::StatusCode, routing::get};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use scraper::Html;
    use serde_json::{Value, json};

    use crate::{
        BackendClient, StaticToken, endpoints,
        monitoring::{
            HttpAggregateFetcher, MonthSelection, QueryPeriod, SCREEN_COOKIE, ScreenRegistry,
        },
        pagination::PaginationConfig,
        test_utils::{assert_valid_html, select_texts, spawn_fake_backend},
    };

    use super::{JobTitle, JobTitlesPageState, filter_job_titles, get_job_titles_page};

    fn job_titles(count: usize) -> Value {
        Value::Array(
            (1..=count)
                .map(|i| json!({ "id": i, "nama_jabatan": format!("Petugas {i:02}") }))
                .collect(),
        )
    }

    async fn get_test_server(backend: Router) -> (TestServer, Arc<ScreenRegistry>) {
        let base_url = spawn_fake_backend(backend).await;
        let backend = BackendClient::new(&base_url, Arc::new(StaticToken::new("token"))).unwrap();
        let screens = Arc::new(ScreenRegistry::new(
            Arc::new(HttpAggregateFetcher::new(backend.clone())),
            Duration::from_secs(60),
        ));
        let state = JobTitlesPageState {
            backend,
            screens: screens.clone(),
            pagination_config: PaginationConfig::default(),
        };
        let app = Router::new()
            .route(endpoints::JOB_TITLES_VIEW, get(get_job_titles_page))
            .with_state(state);

        (
            TestServer::new(app).expect("Could not create test server."),
            screens,
        )
    }

    fn backend_with(body: Value) -> Router {
        Router::new().route(
            "/api/jabatan",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        )
    }

    #[test]
    fn filter_ignores_case_and_keeps_order() {
        let job_titles = [
            JobTitle {
                id: 1,
                name: "Pencacah Lapangan".to_owned(),
            },
            JobTitle {
                id: 2,
                name: "Pengawas".to_owned(),
            },
            JobTitle {
                id: 3,
                name: "Pengolah Data Lapangan".to_owned(),
            },
        ];

        let ids: Vec<_> = filter_job_titles(&job_titles, " LAPANGAN ")
            .into_iter()
            .map(|job_title| job_title.id)
            .collect();

        assert_eq!(ids, [1, 3]);
        assert_eq!(filter_job_titles(&job_titles, "").len(), 3);
    }

    #[tokio::test]
    async fn lists_first_page_of_job_titles() {
        let (server, _) = get_test_server(backend_with(job_titles(12))).await;

        let response = server.get(endpoints::JOB_TITLES_VIEW).await;

        response.assert_status_ok();
        let html = Html::parse_document(&response.text());
        assert_valid_html(&html);
        let names = select_texts(&html, "tbody td:nth-child(2)");
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Petugas 01");
        assert_eq!(select_texts(&html, "span[aria-current=\"page\"]"), ["1"]);
    }

    #[tokio::test]
    async fn search_keeps_requested_page_within_range() {
        let (server, _) = get_test_server(backend_with(job_titles(25))).await;

        let response = server
            .get(endpoints::JOB_TITLES_VIEW)
            .add_query_param("q", "petugas 2")
            .add_query_param("halaman", 3)
            .await;

        let html = Html::parse_document(&response.text());
        // "Petugas 20" to "Petugas 25" fit on one page.
        assert_eq!(
            select_texts(&html, "tbody td:nth-child(2)"),
            [
                "Petugas 20",
                "Petugas 21",
                "Petugas 22",
                "Petugas 23",
                "Petugas 24",
                "Petugas 25"
            ]
        );
        assert!(select_texts(&html, "[data-page]").is_empty());
    }

    #[tokio::test]
    async fn page_links_keep_search_query() {
        let (server, _) = get_test_server(backend_with(job_titles(25))).await;

        let response = server
            .get(endpoints::JOB_TITLES_VIEW)
            .add_query_param("q", "petugas")
            .await;

        let html = Html::parse_document(&response.text());
        let selector = scraper::Selector::parse("a[data-page=\"2\"]").unwrap();
        let link = html.select(&selector).next().unwrap();
        assert_eq!(link.value().attr("href"), Some("/jabatan?q=petugas&halaman=2"));
    }

    #[tokio::test]
    async fn empty_list_has_no_pagination() {
        let (server, _) = get_test_server(backend_with(json!([]))).await;

        let response = server.get(endpoints::JOB_TITLES_VIEW).await;

        let html = Html::parse_document(&response.text());
        assert_eq!(
            select_texts(&html, "[data-state=\"empty\"]"),
            ["Tidak ada data jabatan."]
        );
        assert!(select_texts(&html, "[data-page]").is_empty());
    }

    #[tokio::test]
    async fn expired_session_shows_notice() {
        let backend = Router::new().route(
            "/api/jabatan",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(Value::Null)) }),
        );
        let (server, _) = get_test_server(backend).await;

        let response = server.get(endpoints::JOB_TITLES_VIEW).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let html = Html::parse_document(&response.text());
        assert_eq!(
            select_texts(&html, "[role=\"alert\"]"),
            ["Sesi berakhir. Silakan masuk kembali."]
        );
    }

    #[tokio::test]
    async fn opening_page_closes_monitoring_screen() {
        let (server, screens) = get_test_server(backend_with(job_titles(1))).await;
        let (id, session, _) = screens
            .open(None, QueryPeriod::new(2025, MonthSelection::All))
            .unwrap();

        server
            .get(endpoints::JOB_TITLES_VIEW)
            .add_cookie(Cookie::new(SCREEN_COOKIE, id.to_string()))
            .await
            .assert_status_ok();

        assert_eq!(screens.len(), 0);
        assert!(session.with_screen(|screen| screen.is_closed()).unwrap());
    }
}
