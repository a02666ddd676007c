//! This modules defines the common functionality for paging data.
//!
//! Every list screen pages its rows through [paginate], so the clamping rules
//! are the same everywhere: a page outside the available range is never
//! rendered, it is clamped to the nearest page that exists.

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum rows to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_pages: 5,
        }
    }
}

/// One page of a list, as produced by [paginate].
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    /// The rows on the current page.
    pub items: &'a [T],
    /// The page being shown, always within `1..=total_pages`.
    pub current_page: u64,
    /// The number of pages, at least 1 even for an empty list.
    pub total_pages: u64,
    /// Index of the first row on this page within the full list.
    pub first_index: usize,
    /// Index one past the last row on this page within the full list.
    pub last_index: usize,
}

/// Cut `list` into pages of `page_size` rows and return page `current_page`.
///
/// An empty list still has one (empty) page. `current_page` is clamped to
/// the pages that exist, so a list that shrank since the page was chosen
/// shows its last page rather than an empty one. A `page_size` of zero is
/// treated as one.
pub fn paginate<T>(list: &[T], page_size: u64, current_page: u64) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = (list.len() as u64).div_ceil(page_size).max(1);
    let current_page = current_page.clamp(1, total_pages);

    let first_index = ((current_page - 1) * page_size) as usize;
    let first_index = first_index.min(list.len());
    let last_index = (first_index + page_size as usize).min(list.len());

    Page {
        items: &list[first_index..last_index],
        current_page,
        total_pages,
        first_index,
        last_index,
    }
}

/// The page to show after the user asks for `requested`.
///
/// Requests outside `1..=total_pages` are ignored and `current` is kept.
pub fn change_page(current: u64, requested: u64, total_pages: u64) -> u64 {
    if (1..=total_pages).contains(&requested) {
        requested
    } else {
        current
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// Where a pagination link sends the browser.
#[derive(Debug, Clone, Copy)]
pub enum PageLinkTarget<'a> {
    /// A normal link that loads a full page.
    Href,
    /// An htmx request whose response replaces the element matching the selector.
    Fragment(&'a str),
}

/// Render the pagination indicators as a navigation bar.
///
/// Nothing is rendered when there is only one page.
pub fn pagination_view(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
    target: PageLinkTarget,
) -> Markup {
    let page_count = indicators
        .iter()
        .filter(|indicator| {
            matches!(
                indicator,
                PaginationIndicator::Page(_) | PaginationIndicator::CurrPage(_)
            )
        })
        .count();

    if page_count <= 1 {
        return html!();
    }

    let link_style = "flex items-center justify-center px-3 h-8 leading-tight \
        text-gray-500 bg-white border border-gray-300 hover:bg-gray-100 \
        hover:text-gray-700 dark:bg-gray-800 dark:border-gray-700 \
        dark:text-gray-400 dark:hover:bg-gray-700 dark:hover:text-white";
    let current_style = "flex items-center justify-center px-3 h-8 \
        text-blue-600 border border-gray-300 bg-blue-50 \
        dark:border-gray-700 dark:bg-gray-700 dark:text-white";

    let page_link = |page: u64, text: String| {
        let url = page_url(page);

        match &target {
            PageLinkTarget::Href => html!(
                a href=(url) class=(link_style) data-page=(page) { (text) }
            ),
            PageLinkTarget::Fragment(selector) => html!(
                button
                    type="button"
                    hx-get=(url)
                    hx-target=(selector)
                    hx-swap="outerHTML"
                    class=(link_style)
                    data-page=(page)
                {
                    (text)
                }
            ),
        }
    };

    html!(
        nav aria-label="Navigasi halaman" class="flex justify-center"
        {
            ul class="inline-flex -space-x-px text-sm"
            {
                @for indicator in indicators {
                    li {
                        @match indicator {
                            PaginationIndicator::BackButton(page) => {
                                (page_link(*page, "Sebelumnya".to_owned()))
                            }
                            PaginationIndicator::NextButton(page) => {
                                (page_link(*page, "Berikutnya".to_owned()))
                            }
                            PaginationIndicator::Page(page) => {
                                (page_link(*page, page.to_string()))
                            }
                            PaginationIndicator::CurrPage(page) => {
                                span class=(current_style) aria-current="page" { (page) }
                            }
                            PaginationIndicator::Ellipsis => {
                                span class=(link_style) { "…" }
                            }
                        }
                    }
                }
            }
        }
    )
}
