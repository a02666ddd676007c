//! The transaction monitoring screen.
//!
//! For a chosen period the backend reports each partner's income. The screen
//! measures every partner against the period's limit, lets the viewer search
//! and order the rows locally and pages through them.

mod aggregate;
mod compliance;
mod limit;
mod page;
mod period;
mod screen;
mod search;
mod session;
mod view;

pub use aggregate::HttpAggregateFetcher;
pub use page::{
    MonitoringPageState, get_monitoring_page, get_page_fragment, get_period_fragment,
    get_search_fragment, get_table_fragment,
};
pub use session::ScreenRegistry;

pub(crate) use page::{SCREEN_COOKIE, close_viewer_screen};

#[cfg(test)]
pub(crate) use period::{MonthSelection, QueryPeriod};
