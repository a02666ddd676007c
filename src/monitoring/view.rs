//! HTML rendering for the monitoring page and its table fragment.

use maud::{Markup, html};

use crate::{
    alert::Alert,
    backend::FetchError,
    endpoints,
    html::{
        BADGE_DANGER_STYLE, BADGE_NEUTRAL_STYLE, BADGE_SUCCESS_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_rupiah, loading_spinner,
    },
    navigation::NavBar,
    pagination::{PageLinkTarget, create_pagination_indicators, pagination_view},
};

use super::{
    compliance::ComplianceStatus,
    limit::ComplianceLimit,
    period::{MonthSelection, QueryPeriod, YearRange},
    screen::{LoadFailure, RowOrder, RowView, ScreenView, TableContent},
};

/// The id of the element that table fragments replace.
pub(crate) const TABLE_ID: &str = "monitoring-table";
const TABLE_SELECTOR: &str = "#monitoring-table";

/// The console URL for `period`, e.g. "/transaksi/periode?tahun=2025&bulan=3".
pub(crate) fn period_url(route: &str, period: QueryPeriod) -> String {
    format!(
        "{route}?tahun={}&bulan={}",
        period.year,
        period.month.as_query_value()
    )
}

/// Render the full monitoring page.
pub(crate) fn monitoring_view(view: &ScreenView, years: &YearRange, max_pages: u64) -> Markup {
    let nav_bar = NavBar::new(endpoints::MONITORING_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-2"
                {
                    h1 class="text-xl font-bold" { "Monitoring Transaksi Mitra" }

                    span id="indicator" class="htmx-indicator text-sm"
                    {
                        (loading_spinner()) "Memuat..."
                    }
                }

                div class="flex flex-wrap gap-4 items-end"
                {
                    (period_form(view.selected_period, years))
                    (search_form(&view.query, view.order))
                }

                (monitoring_table(view, max_pages))
            }
        }
    };

    base("Monitoring Transaksi", &content)
}

fn period_form(selected: QueryPeriod, years: &YearRange) -> Markup {
    html! {
        form
            id="period-form"
            class="flex gap-2"
            hx-get=(endpoints::MONITORING_PERIOD)
            hx-trigger="change"
            hx-target=(TABLE_SELECTOR)
            hx-swap="outerHTML"
            hx-sync="this:replace"
            hx-indicator="#indicator"
        {
            div
            {
                label for="tahun" class=(FORM_LABEL_STYLE) { "Tahun" }
                select id="tahun" name="tahun" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for year in years.years() {
                        option value=(year) selected[year == selected.year] { (year) }
                    }
                }
            }

            div
            {
                label for="bulan" class=(FORM_LABEL_STYLE) { "Bulan" }
                select id="bulan" name="bulan" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for month in MonthSelection::options() {
                        option
                            value=(month.as_query_value())
                            selected[month == selected.month]
                        {
                            (month.label())
                        }
                    }
                }
            }
        }
    }
}

fn search_form(query: &str, order: RowOrder) -> Markup {
    html! {
        form
            id="search-form"
            class="flex gap-2 grow"
            hx-get=(endpoints::MONITORING_SEARCH)
            hx-trigger="input delay:300ms, change"
            hx-target=(TABLE_SELECTOR)
            hx-swap="outerHTML"
            hx-sync="this:replace"
        {
            div class="grow"
            {
                label for="q" class=(FORM_LABEL_STYLE) { "Cari nama atau SOBAT ID" }
                input
                    id="q"
                    type="search"
                    name="q"
                    value=(query)
                    placeholder="Cari mitra..."
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="urut" class=(FORM_LABEL_STYLE) { "Urutkan" }
                select id="urut" name="urut" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for option in RowOrder::ALL {
                        option value=(option.as_query_value()) selected[option == order]
                        {
                            (option.label())
                        }
                    }
                }
            }
        }
    }
}

/// Render the table area, the part of the page that htmx requests replace.
pub(crate) fn monitoring_table(view: &ScreenView, max_pages: u64) -> Markup {
    if view.content == TableContent::Loading {
        return html! {
            div
                id=(TABLE_ID)
                hx-get=(endpoints::MONITORING_TABLE)
                hx-trigger="load delay:500ms"
                hx-swap="outerHTML"
                aria-busy="true"
            {
                p class="py-8 text-center" data-state="loading"
                {
                    (loading_spinner()) "Memuat data " (view.selected_period.to_string()) "..."
                }
            }
        };
    }

    let indicators = create_pagination_indicators(view.current_page, view.total_pages, max_pages);

    html! {
        div id=(TABLE_ID) class="space-y-3"
        {
            @if let Some((period, failure)) = &view.failure {
                (failure_alert(*period, failure, view.batch_period))
            }

            @if view.batch_period.is_some() {
                (limit_summary(view))
            }

            @match view.content {
                TableContent::NoBatch => {
                    p class="py-8 text-center" data-state="no-batch" { "Data belum dimuat." }
                }
                TableContent::Empty => {
                    p class="py-8 text-center" data-state="empty"
                    {
                        "Tidak ada data untuk "
                        (view.batch_period.unwrap_or(view.selected_period).to_string())
                        "."
                    }
                }
                TableContent::NoMatch => {
                    p class="py-8 text-center" data-state="no-match"
                    {
                        "Tidak ada mitra yang cocok dengan \"" (view.query) "\"."
                    }
                }
                TableContent::Rows | TableContent::Loading => {
                    (rows_table(&view.rows))
                }
            }

            (pagination_view(
                &indicators,
                |page| format!("{}?halaman={page}", endpoints::MONITORING_PAGE),
                PageLinkTarget::Fragment(TABLE_SELECTOR),
            ))
        }
    }
}

fn limit_summary(view: &ScreenView) -> Markup {
    html! {
        div class="flex flex-wrap gap-4 text-sm" data-limit=[view.limit.amount()]
        {
            span
            {
                "Batas periode: "
                @match view.limit {
                    ComplianceLimit::Ceiling(amount) => {
                        span class="font-semibold" { (format_rupiah(amount)) }
                    }
                    ComplianceLimit::Unset => {
                        span class="font-semibold" data-state="limit-unset" { "Batas belum diatur" }
                    }
                }
            }

            span data-counts
            {
                (view.matching_records) " dari " (view.total_records) " mitra"
                @if view.over_limit_records > 0 {
                    ", " (view.over_limit_records) " melebihi batas"
                }
            }
        }
    }
}

fn failure_alert(
    period: QueryPeriod,
    failure: &LoadFailure,
    batch_period: Option<QueryPeriod>,
) -> Markup {
    let retained = match batch_period {
        Some(batch_period) => format!("Menampilkan data terakhir untuk {batch_period}."),
        None => String::new(),
    };

    let alert = match failure {
        LoadFailure::Fetch(FetchError::SessionExpired) => Alert::Error {
            message: "Sesi berakhir.".to_owned(),
            details: format!("Silakan masuk kembali. {retained}").trim().to_owned(),
        },
        LoadFailure::Fetch(_) => Alert::Error {
            message: format!("Gagal memuat data {period}."),
            details: retained,
        },
        LoadFailure::InconsistentLimit(error) => Alert::Warning {
            message: format!("Data batas untuk {period} tidak konsisten."),
            details: format!("Batas untuk {} berbeda dari mitra lain. {retained}", error.partner)
                .trim()
                .to_owned(),
        },
    };

    html! {
        div data-state="failed"
        {
            (alert.into_html())

            button
                type="button"
                class=(LINK_STYLE)
                hx-get=(period_url(endpoints::MONITORING_PERIOD, period))
                hx-target=(TABLE_SELECTOR)
                hx-swap="outerHTML"
            {
                "Coba lagi"
            }
        }
    }
}

fn rows_table(rows: &[RowView]) -> Markup {
    html! {
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "No" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Nama Lengkap" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "SOBAT ID" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Pendapatan" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Persentase Batas" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                }
            }

            tbody
            {
                @for row in rows {
                    (row_view(row))
                }
            }
        }
    }
}

fn row_view(row: &RowView) -> Markup {
    let aggregate = &row.aggregate;
    let status = row.status;

    html! {
        tr
            class=(TABLE_ROW_STYLE)
            data-partner-id=(aggregate.partner_id.to_string())
            data-over-limit=(status.is_over_limit().to_string())
        {
            td class=(TABLE_CELL_STYLE) { (row.number) }
            th scope="row" class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
            {
                (aggregate.full_name)
            }
            td class=(TABLE_CELL_STYLE) { (aggregate.external_id.as_deref().unwrap_or("-")) }
            td class=(TABLE_CELL_STYLE) data-income
            {
                @match aggregate.period_income {
                    Some(income) => { (format_rupiah(income)) }
                    None => { "-" }
                }
            }
            td class=(TABLE_CELL_STYLE) { (utilization(status)) }
            td class=(TABLE_CELL_STYLE) { (status_badge(status)) }
        }
    }
}

fn utilization(status: ComplianceStatus) -> Markup {
    let Some(label) = status.percent_label() else {
        return html! { span class="text-gray-400" data-percent { "-" } };
    };
    let bar_style = if status.is_over_limit() {
        "h-2.5 rounded-full bg-red-600"
    } else {
        "h-2.5 rounded-full bg-blue-600"
    };

    html! {
        div class="flex items-center gap-2"
        {
            div class="w-24 h-2.5 bg-gray-200 rounded-full dark:bg-gray-700"
            {
                div
                    class=(bar_style)
                    role="progressbar"
                    data-bar
                    style=(format!("width: {:.1}%", status.bar_width()))
                {}
            }

            span data-percent { (label) }
        }
    }
}

fn status_badge(status: ComplianceStatus) -> Markup {
    let (style, text) = match status {
        ComplianceStatus::LimitUnset => (BADGE_NEUTRAL_STYLE, "Batas belum diatur"),
        ComplianceStatus::Incomplete => (BADGE_NEUTRAL_STYLE, "Data tidak lengkap"),
        ComplianceStatus::Measured {
            is_over_limit: true,
            ..
        } => (BADGE_DANGER_STYLE, "Melebihi batas"),
        ComplianceStatus::Measured { .. } => (BADGE_SUCCESS_STYLE, "Dalam batas"),
    };

    html! { span class=(style) data-status { (text) } }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::{
        backend::FetchError,
        monitoring::{
            aggregate::PartnerPeriodAggregate,
            period::{Month, MonthSelection, QueryPeriod, YearRange},
            screen::{MonitoringScreen, ScreenView},
        },
        test_utils::{assert_valid_html, select_texts},
    };

    use super::{monitoring_table, monitoring_view};

    const PAGE_SIZE: u64 = 10;
    const MAX_PAGES: u64 = 5;

    fn year(year: i32) -> QueryPeriod {
        QueryPeriod::new(year, MonthSelection::All)
    }

    fn loaded(records: Vec<PartnerPeriodAggregate>) -> MonitoringScreen {
        let mut screen = MonitoringScreen::new(year(2025));
        let ticket = screen.select_period(year(2025));
        screen.apply(ticket, Ok(records));
        screen
    }

    fn render_table(view: &ScreenView) -> Html {
        let html = Html::parse_fragment(&monitoring_table(view, MAX_PAGES).into_string());
        assert_valid_html(&html);
        html
    }

    fn bar_widths(html: &Html) -> Vec<String> {
        let selector = Selector::parse("[data-bar]").unwrap();
        html.select(&selector)
            .map(|bar| bar.value().attr("style").unwrap_or_default().to_owned())
            .collect()
    }

    #[test]
    fn shows_over_limit_and_within_limit_partners() {
        let screen = loaded(vec![
            PartnerPeriodAggregate::new("1", "Siti")
                .with_external_id("A1")
                .with_income(1_200_000.0)
                .with_limit(1_000_000.0),
            PartnerPeriodAggregate::new("2", "Budi")
                .with_external_id("B2")
                .with_income(800_000.0)
                .with_limit(1_000_000.0),
        ]);

        let html = render_table(&screen.project(PAGE_SIZE));

        assert_eq!(select_texts(&html, "tbody th"), ["Siti", "Budi"]);
        assert_eq!(select_texts(&html, "[data-percent]"), ["120.0%", "80.0%"]);
        assert_eq!(bar_widths(&html), ["width: 100.0%", "width: 80.0%"]);
        assert_eq!(
            select_texts(&html, "[data-status]"),
            ["Melebihi batas", "Dalam batas"]
        );
        assert_eq!(
            select_texts(&html, "[data-income]"),
            ["Rp 1.200.000", "Rp 800.000"]
        );
        assert_eq!(
            select_texts(&html, "tr[data-over-limit=\"true\"] th"),
            ["Siti"]
        );
    }

    #[test]
    fn empty_batch_shows_unset_limit_without_pagination() {
        let screen = loaded(Vec::new());

        let html = render_table(&screen.project(PAGE_SIZE));

        assert_eq!(
            select_texts(&html, "[data-state=\"limit-unset\"]"),
            ["Batas belum diatur"]
        );
        assert_eq!(
            select_texts(&html, "[data-state=\"empty\"]"),
            ["Tidak ada data untuk Tahun 2025."]
        );
        assert!(select_texts(&html, "nav").is_empty());
        assert!(select_texts(&html, "[data-percent]").is_empty());
    }

    #[test]
    fn rows_without_limit_show_unset_status() {
        let screen = loaded(vec![
            PartnerPeriodAggregate::new("1", "Siti").with_income(500.0),
            PartnerPeriodAggregate::new("2", "Budi").with_income(0.0),
        ]);

        let html = render_table(&screen.project(PAGE_SIZE));

        assert_eq!(
            select_texts(&html, "[data-status]"),
            ["Batas belum diatur", "Batas belum diatur"]
        );
        assert_eq!(select_texts(&html, "[data-percent]"), ["-", "-"]);
        assert!(bar_widths(&html).is_empty());
    }

    #[test]
    fn malformed_income_is_incomplete() {
        let screen = loaded(vec![
            PartnerPeriodAggregate::new("1", "Siti").with_limit(1_000.0),
        ]);

        let html = render_table(&screen.project(PAGE_SIZE));

        assert_eq!(select_texts(&html, "[data-status]"), ["Data tidak lengkap"]);
        assert_eq!(select_texts(&html, "[data-income]"), ["-"]);
        assert!(!html.html().contains("NaN"));
    }

    #[test]
    fn loading_polls_for_table() {
        let mut screen = loaded(vec![PartnerPeriodAggregate::new("1", "Siti")]);
        screen.select_period(QueryPeriod::new(2024, MonthSelection::Month(Month::March)));

        let html = render_table(&screen.project(PAGE_SIZE));
        let selector = Selector::parse("#monitoring-table").unwrap();
        let table = html.select(&selector).next().unwrap();

        assert_eq!(table.value().attr("hx-get"), Some("/transaksi/tabel"));
        assert_eq!(
            select_texts(&html, "[data-state=\"loading\"]"),
            ["Memuat data Maret 2024..."]
        );
        assert!(select_texts(&html, "tbody th").is_empty());
    }

    #[test]
    fn failure_keeps_previous_rows_and_offers_retry() {
        let mut screen = loaded(vec![PartnerPeriodAggregate::new("1", "Siti")]);
        let ticket = screen.select_period(year(2024));
        screen.apply(ticket, Err(FetchError::Status(503)));

        let html = render_table(&screen.project(PAGE_SIZE));
        let selector = Selector::parse("[data-state=\"failed\"] button").unwrap();
        let retry = html.select(&selector).next().unwrap();

        let alert = select_texts(&html, "[role=\"alert\"]");
        assert_eq!(
            alert,
            ["Gagal memuat data Tahun 2024. Menampilkan data terakhir untuk Tahun 2025."]
        );
        assert_eq!(
            retry.value().attr("hx-get"),
            Some("/transaksi/periode?tahun=2024&bulan=all")
        );
        assert_eq!(select_texts(&html, "tbody th"), ["Siti"]);
    }

    #[test]
    fn session_expired_failure_asks_to_sign_in() {
        let mut screen = MonitoringScreen::new(year(2025));
        let ticket = screen.select_period(year(2025));
        screen.apply(ticket, Err(FetchError::SessionExpired));

        let html = render_table(&screen.project(PAGE_SIZE));

        assert_eq!(
            select_texts(&html, "[role=\"alert\"]"),
            ["Sesi berakhir. Silakan masuk kembali."]
        );
        assert_eq!(
            select_texts(&html, "[data-state=\"no-batch\"]"),
            ["Data belum dimuat."]
        );
    }

    #[test]
    fn pagination_buttons_target_table() {
        let records = (1..=25)
            .map(|i| PartnerPeriodAggregate::new(i.to_string(), format!("Mitra {i}")))
            .collect();
        let screen = loaded(records);

        let html = render_table(&screen.project(PAGE_SIZE));
        let selector = Selector::parse("nav button").unwrap();
        let targets: Vec<_> = html
            .select(&selector)
            .map(|button| {
                (
                    button.value().attr("hx-get").unwrap_or_default().to_owned(),
                    button.value().attr("hx-target").unwrap_or_default().to_owned(),
                )
            })
            .collect();

        assert_eq!(select_texts(&html, "tbody tr").len(), 10);
        assert!(targets.contains(&(
            "/transaksi/halaman?halaman=2".to_owned(),
            "#monitoring-table".to_owned()
        )));
    }

    #[test]
    fn full_page_preselects_period_and_query() {
        let mut screen = loaded(vec![PartnerPeriodAggregate::new("1", "Siti")]);
        screen.set_query("sit");
        let ticket =
            screen.select_period(QueryPeriod::new(2024, MonthSelection::Month(Month::May)));
        screen.apply(ticket, Ok(vec![PartnerPeriodAggregate::new("1", "Siti")]));

        let html = Html::parse_document(
            &monitoring_view(&screen.project(PAGE_SIZE), &YearRange::around(2025), MAX_PAGES)
                .into_string(),
        );
        assert_valid_html(&html);

        assert_eq!(select_texts(&html, "#tahun option[selected]"), ["2024"]);
        assert_eq!(select_texts(&html, "#bulan option[selected]"), ["Mei"]);
        assert_eq!(select_texts(&html, "#tahun option").len(), 6);
        let selector = Selector::parse("#q").unwrap();
        let input = html.select(&selector).next().unwrap();
        assert_eq!(input.value().attr("value"), Some("sit"));
        assert_eq!(select_texts(&html, "h1"), ["Monitoring Transaksi Mitra"]);
    }
}
