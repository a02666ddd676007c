//! Per-partner income aggregates and how they are fetched from the backend.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, de::IgnoredAny};

use crate::{
    BackendClient,
    backend::FetchError,
    endpoints,
    monitoring::{
        limit::{ComplianceLimit, InconsistentLimitError, resolve_limit},
        period::QueryPeriod,
    },
};

/// The backend's identifier for a partner.
///
/// The backend sends either a number or a string, the console only ever
/// compares and displays it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartnerId(String);

impl PartnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One partner's income for the queried period.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "AggregateRecord")]
pub struct PartnerPeriodAggregate {
    pub partner_id: PartnerId,
    pub full_name: String,
    pub external_id: Option<String>,
    /// `None` when the backend sent no usable income.
    pub period_income: Option<f64>,
    /// The period's limit as repeated on every record, if sent.
    pub period_limit: Option<f64>,
}

impl PartnerPeriodAggregate {
    pub fn new(partner_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            partner_id: PartnerId::new(partner_id),
            full_name: full_name.into(),
            external_id: None,
            period_income: None,
            period_limit: None,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_income(mut self, income: f64) -> Self {
        self.period_income = Some(income);
        self
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        self.period_limit = Some(limit);
        self
    }
}

/// A record as the aggregate endpoint sends it.
#[derive(Deserialize)]
struct AggregateRecord {
    id: RawId,
    #[serde(default)]
    nama_lengkap: Option<String>,
    #[serde(default)]
    sobat_id: Option<String>,
    #[serde(default)]
    pendapatan_terfilter: Option<RawAmount>,
    #[serde(default)]
    limit_periode: Option<RawAmount>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawAmount {
    /// The amount as a finite, non-negative number, or `None` if it is malformed.
    fn into_amount(self) -> Option<f64> {
        let amount = match self {
            RawAmount::Number(number) => number,
            RawAmount::Text(text) => text.trim().parse().ok()?,
            RawAmount::Other(_) => return None,
        };

        (amount.is_finite() && amount >= 0.0).then_some(amount)
    }
}

impl From<AggregateRecord> for PartnerPeriodAggregate {
    fn from(record: AggregateRecord) -> Self {
        let partner_id = match record.id {
            RawId::Number(number) => PartnerId(number.to_string()),
            RawId::Text(text) => PartnerId(text),
        };

        let period_income = record.pendapatan_terfilter.and_then(RawAmount::into_amount);
        if period_income.is_none() {
            tracing::warn!("partner {partner_id} has no usable period income");
        }

        Self {
            partner_id,
            full_name: record.nama_lengkap.unwrap_or_default(),
            external_id: record
                .sobat_id
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty()),
            period_income,
            period_limit: record.limit_periode.and_then(RawAmount::into_amount),
        }
    }
}

/// The records fetched for one period together with the period's limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub period: QueryPeriod,
    /// The records in the order the backend sent them.
    pub records: Vec<PartnerPeriodAggregate>,
    pub limit: ComplianceLimit,
}

impl Batch {
    /// Resolve the limit for `records` and bundle them as the batch for `period`.
    ///
    /// # Errors
    /// Returns [InconsistentLimitError] if the records disagree on the limit.
    pub fn new(
        period: QueryPeriod,
        records: Vec<PartnerPeriodAggregate>,
    ) -> Result<Self, InconsistentLimitError> {
        let limit = resolve_limit(&records)?;

        Ok(Self {
            period,
            records,
            limit,
        })
    }
}

/// Fetches the aggregates for a period.
#[async_trait]
pub trait AggregateFetcher: Send + Sync + fmt::Debug {
    /// Fetch every partner's aggregate for `period`, in server order.
    async fn fetch(&self, period: QueryPeriod) -> Result<Vec<PartnerPeriodAggregate>, FetchError>;
}

/// Fetches aggregates from the backend's transaction endpoint.
#[derive(Debug, Clone)]
pub struct HttpAggregateFetcher {
    backend: BackendClient,
}

impl HttpAggregateFetcher {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl AggregateFetcher for HttpAggregateFetcher {
    async fn fetch(&self, period: QueryPeriod) -> Result<Vec<PartnerPeriodAggregate>, FetchError> {
        self.backend
            .get_json(endpoints::BACKEND_TRANSACTIONS, &period.backend_query())
            .await
    }
}
