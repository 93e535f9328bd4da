//! Implements the `Backend` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a running backend.

use crate::api::{Backend, SummaryKind, SummaryQuery};
use crate::error::Res;
use crate::model::{BudgetItems, GroupedCounts, RawRecord};
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// The year that has seed data. Other years are empty.
pub(crate) const SEED_YEAR: i32 = 2024;

/// A shared list of the requests a `TestBackend` has served, for asserting on fetch counts.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestLog(Arc<Mutex<Vec<String>>>);

impl RequestLog {
    fn push(&self, request: String) {
        if let Ok(mut log) = self.0.lock() {
            log.push(request);
        }
    }

    #[cfg(test)]
    pub(crate) fn requests(&self) -> Vec<String> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

/// An implementation of the `Backend` trait that does not make network requests. It holds JSON
/// responses in memory and, by default, is seeded with data for `SEED_YEAR`.
pub(crate) struct TestBackend {
    records: BTreeMap<i32, String>,
    budget_items: BTreeMap<i32, String>,
    summaries: BTreeMap<SummaryQuery, String>,
    log: RequestLog,
}

impl TestBackend {
    /// A backend with no data at all.
    pub(crate) fn empty() -> Self {
        Self {
            records: BTreeMap::new(),
            budget_items: BTreeMap::new(),
            summaries: BTreeMap::new(),
            log: RequestLog::default(),
        }
    }

    pub(crate) fn with_records(mut self, year: i32, json: impl Into<String>) -> Self {
        self.records.insert(year, json.into());
        self
    }

    pub(crate) fn with_budget_items(mut self, year: i32, json: impl Into<String>) -> Self {
        self.budget_items.insert(year, json.into());
        self
    }

    pub(crate) fn with_summary(mut self, query: SummaryQuery, json: impl Into<String>) -> Self {
        self.summaries.insert(query, json.into());
        self
    }

    /// A handle on the requests served by this backend. It stays valid after the backend has been
    /// boxed.
    #[cfg(test)]
    pub(crate) fn log(&self) -> RequestLog {
        self.log.clone()
    }
}

impl Default for TestBackend {
    /// Loads seed data from this module.
    fn default() -> Self {
        TestBackend::empty()
            .with_records(SEED_YEAR, RECORDS_DATA)
            .with_budget_items(SEED_YEAR, BUDGET_ITEMS_DATA)
            .with_summary(
                SummaryQuery {
                    kind: SummaryKind::Nutrition,
                    year: SEED_YEAR,
                    month: None,
                },
                NUTRITION_DATA,
            )
            .with_summary(
                SummaryQuery {
                    kind: SummaryKind::Nutrition,
                    year: SEED_YEAR,
                    month: Some(1),
                },
                NUTRITION_JANUARY_DATA,
            )
            .with_summary(
                SummaryQuery {
                    kind: SummaryKind::Vaccination,
                    year: SEED_YEAR,
                    month: None,
                },
                VACCINATION_DATA,
            )
    }
}

fn parse<T>(json: Option<&String>, empty: &str, what: &str) -> Res<T>
where
    T: DeserializeOwned,
{
    let json = json.map(String::as_str).unwrap_or(empty);
    serde_json::from_str(json).with_context(|| format!("Unable to parse test data for {what}"))
}

#[async_trait::async_trait]
impl Backend for TestBackend {
    async fn income_expense(&mut self, year: i32) -> Res<Vec<RawRecord>> {
        let request = format!("income_expense {year}");
        trace!("{request}");
        self.log.push(request);
        parse(self.records.get(&year), "[]", "income and expense records")
    }

    async fn budget_items(&mut self, year: i32) -> Res<BudgetItems> {
        let request = format!("budget_items {year}");
        trace!("{request}");
        self.log.push(request);
        parse(self.budget_items.get(&year), "[]", "budget items")
    }

    async fn summary(&mut self, query: SummaryQuery) -> Res<GroupedCounts> {
        let request = format!("summary {query}");
        trace!("{request}");
        self.log.push(request);
        parse(self.summaries.get(&query), "{}", "summary")
    }
}

const RECORDS_DATA: &str = r#"[
  {"entryType": "Expense", "datetime": "2024-01-12T09:15:00+08:00", "amount": "15,000.00", "actualAmount": "14,250.00", "budgetItem": "Office Supplies"},
  {"entryType": "Expense", "datetime": "2024-02-15T10:00:00+08:00", "amount": 1000, "actualAmount": null, "budgetItem": "Office Supplies"},
  {"entryType": "Expense", "datetime": "2024-03-02T14:30:00+08:00", "amount": 25000, "actualAmount": 23800, "budgetItem": "Barangay Health Station"},
  {"entryType": "Income", "datetime": "2024-03-20T08:00:00+08:00", "amount": 0, "actualAmount": "120,000.00", "budgetItem": "Real Property Tax Share"},
  {"entryType": "Expense", "datetime": "2024-04-08T11:45:00+08:00", "amount": "8,500.00", "actualAmount": "0", "budgetItem": "Waste Management"},
  {"entryType": "Expense", "datetime": "2024-05-01T09:00:00+08:00", "amount": 9999, "actualAmount": 500, "budgetItem": "Office Supplies"},
  {"entryType": "Income", "datetime": "2024-05-17T13:00:00+08:00", "amount": 0, "actualAmount": "4,300.00", "budgetItem": "Barangay Clearance Fees"},
  {"entryType": "Expense", "datetime": "2024-06-30T16:20:00+08:00", "amount": 12000, "actualAmount": "pending", "budgetItem": "Waste Management"},
  {"entryType": "Expense", "datetime": "2024-07-19T10:10:00+08:00", "amount": 40000, "actualAmount": 38950.75, "budgetItem": "Infrastructure"},
  {"entryType": "Expense", "datetime": "unknown", "amount": 5000, "actualAmount": 5000, "budgetItem": "Infrastructure"},
  {"entryType": "Income", "datetime": "2024-08-05T08:30:00+08:00", "amount": 0, "actualAmount": "118,500.00", "budgetItem": "Real Property Tax Share"},
  {"entryType": "Expense", "datetime": "2024-09-25T15:00:00+08:00", "amount": 0, "actualAmount": null, "budgetItem": "Disaster Preparedness"},
  {"entryType": "Expense", "datetime": "2024-10-03T09:40:00+08:00", "amount": 30000, "actualAmount": 31200, "budgetItem": "Barangay Health Station"},
  {"entryType": "Income", "datetime": "2024-11-14T10:00:00+08:00", "amount": 0, "actualAmount": "3,150.00", "budgetItem": "Barangay Clearance Fees"},
  {"entryType": "Expense", "datetime": "2024-12-10T13:15:00+08:00", "amount": "6,000.00", "actualAmount": "5,875.50", "budgetItem": "Waste Management"}
]"#;

const BUDGET_ITEMS_DATA: &str = r#"[
  {"name": "Office Supplies", "proposedBudget": "60,000.00"},
  {"name": "Barangay Health Station", "proposedBudget": "150,000.00"},
  {"name": "Waste Management", "proposedBudget": "80,000.00"},
  {"name": "Infrastructure", "proposedBudget": "500,000.00"},
  {"name": "Disaster Preparedness", "proposedBudget": "100,000.00"}
]"#;

const NUTRITION_DATA: &str = r#"{
  "normal": {"male": 112, "female": 120},
  "underweight": {"male": 14, "female": 11},
  "severely_underweight": {"male": 3, "female": 2},
  "overweight": {"male": 6, "female": 9},
  "obese": {"male": 2}
}"#;

const NUTRITION_JANUARY_DATA: &str = r#"{
  "normal": {"male": 10, "female": 12},
  "underweight": {"male": 2, "female": 1}
}"#;

const VACCINATION_DATA: &str = r#"{
  "fully_vaccinated": {"0-1": 41, "1-5": 187, "6-12": 64},
  "partially_vaccinated": {"0-1": 12, "1-5": 9},
  "not_vaccinated": {"0-1": 3, "1-5": 5, "6-12": 2}
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_data_parses() {
        let mut backend = TestBackend::default();
        let records = backend.income_expense(SEED_YEAR).await.unwrap();
        assert_eq!(records.len(), 15);
        let budget = backend.budget_items(SEED_YEAR).await.unwrap();
        assert_eq!(budget.len(), 5);
        let nutrition = backend
            .summary(SummaryQuery {
                kind: SummaryKind::Nutrition,
                year: SEED_YEAR,
                month: None,
            })
            .await
            .unwrap();
        assert_eq!(nutrition.rows().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_year_is_empty() {
        let mut backend = TestBackend::default();
        assert!(backend.income_expense(1999).await.unwrap().is_empty());
        assert!(backend.budget_items(1999).await.unwrap().is_empty());
        let summary = backend
            .summary(SummaryQuery {
                kind: SummaryKind::Vaccination,
                year: 1999,
                month: None,
            })
            .await
            .unwrap();
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn test_request_log() {
        let mut backend = TestBackend::default();
        let log = backend.log();
        backend.income_expense(2024).await.unwrap();
        backend.budget_items(2023).await.unwrap();
        assert_eq!(
            log.requests(),
            vec!["income_expense 2024".to_string(), "budget_items 2023".to_string()]
        );
    }
}
