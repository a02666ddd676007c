//! The period a monitoring query covers: a year and either one month or the whole year.

use std::{fmt, str::FromStr};

pub use time::Month;

use crate::Error;

/// How many years before the current year the selector offers.
const YEARS_BACK: i32 = 4;
/// How many years after the current year the selector offers.
const YEARS_AHEAD: i32 = 1;

/// The Indonesian name of `month`.
pub fn month_label(month: Month) -> &'static str {
    match month {
        Month::January => "Januari",
        Month::February => "Februari",
        Month::March => "Maret",
        Month::April => "April",
        Month::May => "Mei",
        Month::June => "Juni",
        Month::July => "Juli",
        Month::August => "Agustus",
        Month::September => "September",
        Month::October => "Oktober",
        Month::November => "November",
        Month::December => "Desember",
    }
}

/// The month part of a period: the whole year or a single month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum MonthSelection {
    #[default]
    All,
    Month(Month),
}

impl MonthSelection {
    /// The selector's options: "all" first, then January to December.
    pub fn options() -> Vec<MonthSelection> {
        let months = std::iter::successors(Some(Month::January), |month| Some(month.next()));

        std::iter::once(MonthSelection::All)
            .chain(months.take(12).map(MonthSelection::Month))
            .collect()
    }

    /// The value used in console URLs, "all" or the month number.
    pub fn as_query_value(self) -> String {
        match self {
            MonthSelection::All => "all".to_owned(),
            MonthSelection::Month(month) => u8::from(month).to_string(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MonthSelection::All => "Semua Bulan",
            MonthSelection::Month(month) => month_label(month),
        }
    }
}

impl FromStr for MonthSelection {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.eq_ignore_ascii_case("all") {
            return Ok(MonthSelection::All);
        }

        value
            .parse::<u8>()
            .ok()
            .and_then(|number| Month::try_from(number).ok())
            .map(MonthSelection::Month)
            .ok_or_else(|| Error::InvalidPeriod(format!("month \"{value}\"")))
    }
}

/// The years the period selector offers, relative to the current year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    current_year: i32,
}

impl YearRange {
    pub fn around(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// The selectable years, newest first.
    pub fn years(&self) -> Vec<i32> {
        ((self.current_year - YEARS_BACK)..=(self.current_year + YEARS_AHEAD))
            .rev()
            .collect()
    }

    pub fn contains(&self, year: i32) -> bool {
        ((self.current_year - YEARS_BACK)..=(self.current_year + YEARS_AHEAD)).contains(&year)
    }
}

/// A year and month selection that scopes one aggregate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryPeriod {
    pub year: i32,
    pub month: MonthSelection,
}

impl QueryPeriod {
    pub fn new(year: i32, month: MonthSelection) -> Self {
        Self { year, month }
    }

    /// Build a period from user input, rejecting years the selector does not offer.
    pub fn parse(year: i32, month: &str, years: &YearRange) -> Result<Self, Error> {
        if !years.contains(year) {
            return Err(Error::InvalidPeriod(format!("year {year}")));
        }

        Ok(Self::new(year, month.parse()?))
    }

    /// The query parameters for the backend aggregate endpoint.
    ///
    /// `bulan` is left out entirely for a whole-year period.
    pub fn backend_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("tahun", self.year.to_string())];

        if let MonthSelection::Month(month) = self.month {
            query.push(("bulan", u8::from(month).to_string()));
        }

        query
    }
}

impl fmt::Display for QueryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            MonthSelection::All => write!(f, "Tahun {}", self.year),
            MonthSelection::Month(month) => write!(f, "{} {}", month_label(month), self.year),
        }
    }
}
