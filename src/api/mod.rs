//! The `Backend` trait and its implementations for fetching barangay records.
//!
//! `HttpBackend` talks to the real REST backend. `TestBackend` serves seeded data from memory so
//! the whole program can run without a server; it is selected when
//! `BRGY_REPORTS_IN_TEST_MODE` is set.

mod http;
mod test_backend;

use crate::error::Res;
use crate::model::{BudgetItems, GroupedCounts, RawRecord};
use crate::Config;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::debug;

pub(crate) use http::HttpBackend;
pub(crate) use test_backend::TestBackend;

/// Income and expense tracking records, queried by `year`.
pub(crate) const INCOME_EXPENSE: &str = "treasurer/income-expense-tracking/";
/// Budget items, queried by `year`.
pub(crate) const BUDGET_ITEMS: &str = "treasurer/budget-items/";
/// Nutritional status counts, queried by `year` and optionally `month`.
pub(crate) const OPT_TRACKING_SUMMARY: &str = "health/opt-tracking-summary/";
/// Vaccination status counts, queried by `year`.
pub(crate) const VACCINATION_SUMMARY: &str = "health/vaccination-summary/";

const TEST_MODE_ENV: &str = "BRGY_REPORTS_IN_TEST_MODE";

/// Where data comes from.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// The backend named in the config.
    Http,
    /// Seeded in-memory data.
    Test,
}

impl Mode {
    /// `Mode::Test` when `BRGY_REPORTS_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// The pre-aggregated summaries served by the health endpoints.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    /// Nutritional status by sex.
    Nutrition,
    /// Vaccination status by age group.
    Vaccination,
}

serde_plain::derive_display_from_serialize!(SummaryKind);

impl SummaryKind {
    pub(crate) fn path(self) -> &'static str {
        match self {
            SummaryKind::Nutrition => OPT_TRACKING_SUMMARY,
            SummaryKind::Vaccination => VACCINATION_SUMMARY,
        }
    }
}

/// The parameters of a summary request. Also the cache key for its response.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SummaryQuery {
    pub kind: SummaryKind,
    pub year: i32,
    pub month: Option<u32>,
}

impl SummaryQuery {
    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("year", self.year.to_string())];
        if let Some(month) = self.month {
            params.push(("month", month.to_string()));
        }
        params
    }
}

impl Display for SummaryQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.month {
            Some(month) => write!(f, "{} summary for {}-{month:02}", self.kind, self.year),
            None => write!(f, "{} summary for {}", self.kind, self.year),
        }
    }
}

/// Read access to the barangay backend.
#[async_trait::async_trait]
pub trait Backend {
    /// All income and expense records of `year`.
    async fn income_expense(&mut self, year: i32) -> Res<Vec<RawRecord>>;

    /// The budget items of `year`.
    async fn budget_items(&mut self, year: i32) -> Res<BudgetItems>;

    /// A pre-aggregated health summary.
    async fn summary(&mut self, query: SummaryQuery) -> Res<GroupedCounts>;
}

/// Creates the `Backend` for `mode`.
pub(crate) async fn backend(config: &Config, mode: Mode) -> Res<Box<dyn Backend + Send>> {
    debug!("Using {mode:?} backend");
    Ok(match mode {
        Mode::Http => Box::new(HttpBackend::new(config).await?),
        Mode::Test => Box::new(TestBackend::default()),
    })
}
