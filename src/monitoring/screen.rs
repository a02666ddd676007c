//! The state of one viewer's monitoring screen.
//!
//! [MonitoringScreen] is a plain state machine: it does no I/O. Every
//! period change hands out a [FetchTicket] stamped with a generation
//! number, and a fetch result is only applied if it carries the newest
//! ticket. This is what keeps a slow response for an old period from
//! overwriting the data for the period the user picked afterwards.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
    backend::FetchError,
    monitoring::{
        aggregate::{Batch, PartnerPeriodAggregate},
        compliance::{ComplianceStatus, compute},
        limit::{ComplianceLimit, InconsistentLimitError},
        period::QueryPeriod,
        search::filter,
    },
    pagination::{change_page, paginate},
};

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    period: QueryPeriod,
}

impl FetchTicket {
    pub fn period(&self) -> QueryPeriod {
        self.period
    }
}

/// Why the latest batch could not be loaded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    InconsistentLimit(#[from] InconsistentLimitError),
}

/// Where the screen is in the fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Nothing has been requested yet.
    Idle,
    /// A fetch for the period is outstanding.
    Loading(QueryPeriod),
    /// The current batch belongs to the selected period.
    Ready,
    /// The fetch for `period` failed. Any earlier batch is kept.
    Failed {
        period: QueryPeriod,
        failure: LoadFailure,
    },
}

/// What happened to a fetch result handed to [MonitoringScreen::apply].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The result replaced the batch.
    Applied,
    /// The result was an error and is now shown as the screen's failure.
    Failed,
    /// A newer period was selected, the result was discarded.
    Superseded,
    /// The screen was closed, the result was discarded.
    Closed,
}

/// The order rows are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum RowOrder {
    /// The order the backend sent.
    #[default]
    #[serde(rename = "server")]
    Server,
    /// Highest income first, rows without income last.
    #[serde(rename = "pendapatan")]
    IncomeDescending,
    #[serde(rename = "nama")]
    NameAscending,
}

impl RowOrder {
    pub const ALL: [RowOrder; 3] = [
        RowOrder::Server,
        RowOrder::IncomeDescending,
        RowOrder::NameAscending,
    ];

    pub fn as_query_value(self) -> &'static str {
        match self {
            RowOrder::Server => "server",
            RowOrder::IncomeDescending => "pendapatan",
            RowOrder::NameAscending => "nama",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RowOrder::Server => "Urutan server",
            RowOrder::IncomeDescending => "Pendapatan tertinggi",
            RowOrder::NameAscending => "Nama (A-Z)",
        }
    }

    fn sort(self, rows: &mut [&PartnerPeriodAggregate]) {
        match self {
            RowOrder::Server => {}
            RowOrder::IncomeDescending => rows.sort_by(|a, b| {
                match (a.period_income, b.period_income) {
                    (Some(a), Some(b)) => b.total_cmp(&a),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }),
            RowOrder::NameAscending => {
                rows.sort_by_cached_key(|row| row.full_name.to_lowercase())
            }
        }
    }
}

/// What the table area shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableContent {
    /// No batch has been loaded, e.g. the first fetch failed.
    NoBatch,
    Loading,
    /// The batch has no records at all.
    Empty,
    /// The batch has records but none match the search.
    NoMatch,
    Rows,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    /// The row's position in the searched and sorted list, starting at 1.
    pub number: usize,
    pub aggregate: PartnerPeriodAggregate,
    pub status: ComplianceStatus,
}

/// Everything the view needs to render the screen once.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenView {
    pub selected_period: QueryPeriod,
    pub query: String,
    pub order: RowOrder,
    pub content: TableContent,
    /// The period of the batch on display, which differs from the selected
    /// period after a failed fetch.
    pub batch_period: Option<QueryPeriod>,
    pub failure: Option<(QueryPeriod, LoadFailure)>,
    pub limit: ComplianceLimit,
    pub rows: Vec<RowView>,
    pub total_records: usize,
    pub matching_records: usize,
    pub over_limit_records: usize,
    pub current_page: u64,
    pub total_pages: u64,
}

/// One viewer's monitoring screen.
#[derive(Debug)]
pub struct MonitoringScreen {
    period: QueryPeriod,
    generation: u64,
    state: LoadState,
    batch: Option<Batch>,
    query: String,
    order: RowOrder,
    page: u64,
    closed: bool,
}

impl MonitoringScreen {
    /// A screen showing `period` that has not fetched anything yet.
    pub fn new(period: QueryPeriod) -> Self {
        Self {
            period,
            generation: 0,
            state: LoadState::Idle,
            batch: None,
            query: String::new(),
            order: RowOrder::default(),
            page: 1,
            closed: false,
        }
    }

    pub fn period(&self) -> QueryPeriod {
        self.period
    }

    #[cfg(test)]
    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[cfg(test)]
    pub fn order(&self) -> RowOrder {
        self.order
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Select `period` and issue the ticket for fetching it.
    ///
    /// Selecting the period that is already shown issues a fresh ticket too,
    /// which is how the user retries after a failure.
    pub fn select_period(&mut self, period: QueryPeriod) -> FetchTicket {
        self.generation += 1;
        self.period = period;
        self.state = LoadState::Loading(period);

        FetchTicket {
            generation: self.generation,
            period,
        }
    }

    /// Whether `ticket` is the newest one issued and could still be applied.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        !self.closed && ticket.generation == self.generation
    }

    /// Apply the result of the fetch identified by `ticket`.
    ///
    /// On success the batch is replaced and the page resets to 1. On failure
    /// the previous batch stays on screen next to the error.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<PartnerPeriodAggregate>, FetchError>,
    ) -> ApplyOutcome {
        if self.closed {
            return ApplyOutcome::Closed;
        }

        if ticket.generation != self.generation {
            tracing::debug!(
                "discarding result for {} (generation {} < {})",
                ticket.period,
                ticket.generation,
                self.generation
            );
            return ApplyOutcome::Superseded;
        }

        let batch = result
            .map_err(LoadFailure::from)
            .and_then(|records| Batch::new(ticket.period, records).map_err(LoadFailure::from));

        match batch {
            Ok(batch) => {
                self.batch = Some(batch);
                self.state = LoadState::Ready;
                self.page = 1;
                ApplyOutcome::Applied
            }
            Err(failure) => {
                tracing::warn!("could not load monitoring data for {}: {failure}", ticket.period);
                self.state = LoadState::Failed {
                    period: ticket.period,
                    failure,
                };
                ApplyOutcome::Failed
            }
        }
    }

    /// Change the search query. The page is kept and clamped when rendering.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_owned();
    }

    pub fn set_order(&mut self, order: RowOrder) {
        self.order = order;
    }

    /// Go to `requested` if that page exists for the current rows.
    pub fn request_page(&mut self, requested: u64, page_size: u64) {
        let total_pages = paginate(&self.visible_records(), page_size, self.page).total_pages;
        let current = self.page.clamp(1, total_pages);

        self.page = change_page(current, requested, total_pages);
    }

    /// Close the screen so that no outstanding fetch can change it any more.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// The batch's records after search and ordering.
    fn visible_records(&self) -> Vec<&PartnerPeriodAggregate> {
        let Some(batch) = &self.batch else {
            return Vec::new();
        };

        let mut records = filter(&batch.records, &self.query);
        self.order.sort(&mut records);
        records
    }

    /// Project the screen into what should be rendered, `page_size` rows at a time.
    pub fn project(&self, page_size: u64) -> ScreenView {
        let failure = match &self.state {
            LoadState::Failed { period, failure } => Some((*period, failure.clone())),
            _ => None,
        };
        let limit = self
            .batch
            .as_ref()
            .map(|batch| batch.limit)
            .unwrap_or_default();
        let total_records = self.batch.as_ref().map_or(0, |batch| batch.records.len());

        let visible = self.visible_records();
        let page = paginate(&visible, page_size, self.page);

        let content = match (&self.state, &self.batch) {
            (LoadState::Loading(_), _) => TableContent::Loading,
            (_, None) => TableContent::NoBatch,
            (_, Some(_)) if total_records == 0 => TableContent::Empty,
            (_, Some(_)) if visible.is_empty() => TableContent::NoMatch,
            (_, Some(_)) => TableContent::Rows,
        };

        let rows = if content == TableContent::Rows {
            page.items
                .iter()
                .enumerate()
                .map(|(offset, aggregate)| RowView {
                    number: page.first_index + offset + 1,
                    aggregate: (*aggregate).clone(),
                    status: compute(aggregate, limit),
                })
                .collect()
        } else {
            Vec::new()
        };

        ScreenView {
            selected_period: self.period,
            query: self.query.clone(),
            order: self.order,
            content,
            batch_period: self.batch.as_ref().map(|batch| batch.period),
            failure,
            limit,
            rows,
            total_records,
            matching_records: visible.len(),
            over_limit_records: visible
                .iter()
                .filter(|aggregate| compute(aggregate, limit).is_over_limit())
                .count(),
            current_page: page.current_page,
            total_pages: page.total_pages,
        }
    }
}
