//! Fetches data through the query cache and feeds it into charts.

use crate::api::{Backend, SummaryQuery};
use crate::cache::QueryCache;
use crate::error::Res;
use crate::model::{BudgetItems, GroupedCounts, Quarter, RawRecord};
use crate::report::{Chart, ChartData, ChartState, ExpenseReport, QuarterSliceRow, QuarterTotals};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Owns the backend and one query cache per kind of response.
pub struct Session {
    backend: Box<dyn Backend + Send>,
    records: QueryCache<i32, Arc<Vec<RawRecord>>>,
    budget_items: QueryCache<i32, BudgetItems>,
    summaries: QueryCache<SummaryQuery, GroupedCounts>,
}

impl Session {
    pub(crate) fn new(backend: Box<dyn Backend + Send>, ttl: Duration) -> Self {
        Self {
            backend,
            records: QueryCache::new(ttl),
            budget_items: QueryCache::new(ttl),
            summaries: QueryCache::new(ttl),
        }
    }

    pub async fn records(&mut self, year: i32) -> Res<Arc<Vec<RawRecord>>> {
        let backend = &mut self.backend;
        self.records
            .get_or_fetch(year, |year| async move {
                backend.income_expense(year).await.map(Arc::new)
            })
            .await
    }

    pub async fn budget_items(&mut self, year: i32) -> Res<BudgetItems> {
        let backend = &mut self.backend;
        self.budget_items
            .get_or_fetch(year, |year| async move { backend.budget_items(year).await })
            .await
    }

    pub async fn summary(&mut self, query: SummaryQuery) -> Res<GroupedCounts> {
        let backend = &mut self.backend;
        self.summaries
            .get_or_fetch(query, |query| async move { backend.summary(query).await })
            .await
    }

    /// Forgets every cached response so the next request of each goes to the backend.
    pub fn invalidate(&mut self) {
        self.records.invalidate_all();
        self.budget_items.invalidate_all();
        self.summaries.invalidate_all();
    }

    /// Selects `year` on `chart` and, if that put it in `Loading`, fetches the records and budget
    /// items and builds the expense report.
    pub async fn load_expenses(&mut self, chart: &mut ExpenseChart, year: i32) {
        if chart.chart.select(year) {
            let result = self.expense_data(year).await;
            chart.chart.resolve(result);
        }
    }

    /// The budget items only annotate the report, so failing to fetch them leaves the ceilings
    /// blank instead of failing the chart.
    async fn expense_data(&mut self, year: i32) -> Res<ExpenseChartData> {
        let records = self.records(year).await?;
        let budget = match self.budget_items(year).await {
            Ok(budget) => budget,
            Err(e) => {
                warn!("Showing expenses for {year} without budget ceilings: {e:#}");
                BudgetItems::default()
            }
        };
        let mut report = ExpenseReport::build(&records, year);
        report.add_unparsed_amounts(budget.unparsed_ceilings());
        Ok(ExpenseChartData { report, budget })
    }

    pub async fn load_totals(&mut self, chart: &mut Chart<i32, QuarterTotals>, year: i32) {
        if chart.select(year) {
            let result = self
                .records(year)
                .await
                .map(|records| QuarterTotals::build(&records, year));
            chart.resolve(result);
        }
    }

    pub async fn load_budget(&mut self, chart: &mut Chart<i32, BudgetItems>, year: i32) {
        if chart.select(year) {
            let result = self.budget_items(year).await;
            chart.resolve(result);
        }
    }

    pub async fn load_summary(
        &mut self,
        chart: &mut Chart<SummaryQuery, GroupedCounts>,
        query: SummaryQuery,
    ) {
        if chart.select(query) {
            let result = self.summary(query).await;
            chart.resolve(result);
        }
    }
}

/// The data behind the expense chart: the report and the budget items used to annotate it.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExpenseChartData {
    pub report: ExpenseReport,
    pub budget: BudgetItems,
}

impl ChartData for ExpenseChartData {
    fn is_empty(&self) -> bool {
        self.report.is_empty()
    }
}

/// The expense chart: a year selection that loads data and a quarter selection that only
/// re-slices what was loaded.
#[derive(Debug, Clone)]
pub struct ExpenseChart {
    chart: Chart<i32, ExpenseChartData>,
    quarter: Option<Quarter>,
}

impl Default for ExpenseChart {
    fn default() -> Self {
        Self {
            chart: Chart::new("expenses"),
            quarter: None,
        }
    }
}

impl ExpenseChart {
    pub fn chart(&self) -> &Chart<i32, ExpenseChartData> {
        &self.chart
    }

    pub fn quarter(&self) -> Option<Quarter> {
        self.quarter
    }

    /// Selects a quarter, or all quarters with `None`. Never fetches.
    pub fn select_quarter(&mut self, quarter: Option<Quarter>) {
        debug!("{}: selected quarter {quarter:?}", self.chart.name());
        self.quarter = quarter;
    }

    /// The rows with spending in the selected quarter. `None` unless data has loaded and a quarter
    /// is selected.
    pub fn slice(&self) -> Option<Vec<QuarterSliceRow>> {
        let quarter = self.quarter?;
        match self.chart.state() {
            ChartState::Success(data) => Some(data.report.slice(quarter, &data.budget)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SummaryKind, TestBackend};
    use crate::report::View;
    use anyhow::bail;
    use rust_decimal::Decimal;

    const HOUR: Duration = Duration::from_secs(3600);

    struct FailingBackend;

    #[async_trait::async_trait]
    impl Backend for FailingBackend {
        async fn income_expense(&mut self, _year: i32) -> Res<Vec<RawRecord>> {
            bail!("Request to http://localhost/ returned 500 Internal Server Error")
        }

        async fn budget_items(&mut self, _year: i32) -> Res<BudgetItems> {
            bail!("Request to http://localhost/ returned 500 Internal Server Error")
        }

        async fn summary(&mut self, _query: SummaryQuery) -> Res<GroupedCounts> {
            bail!("Request to http://localhost/ returned 500 Internal Server Error")
        }
    }

    #[tokio::test]
    async fn test_quarter_change_does_not_refetch() {
        let backend = TestBackend::default();
        let log = backend.log();
        let mut session = Session::new(Box::new(backend), HOUR);
        let mut chart = ExpenseChart::default();

        session.load_expenses(&mut chart, 2024).await;
        assert_eq!(log.requests().len(), 2);

        chart.select_quarter(Some(Quarter::Q1));
        let q1 = chart.slice().unwrap();
        assert_eq!(q1.len(), 2);
        assert_eq!(q1[1].budget_item, "Office Supplies");
        assert_eq!(q1[1].amount, Decimal::from(15250));

        chart.select_quarter(Some(Quarter::Q2));
        let q2 = chart.slice().unwrap();
        assert_eq!(q2.len(), 2);
        assert!(q2.iter().all(|r| r.amount > Decimal::ZERO));

        // Re-selecting the same year is a no-op.
        session.load_expenses(&mut chart, 2024).await;
        assert_eq!(log.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_year_change_reloads_and_cache_is_shared() {
        let backend = TestBackend::default();
        let log = backend.log();
        let mut session = Session::new(Box::new(backend), HOUR);

        let mut expenses = ExpenseChart::default();
        session.load_expenses(&mut expenses, 2024).await;
        let mut totals = Chart::new("totals");
        session.load_totals(&mut totals, 2024).await;
        // The totals chart reuses the cached records.
        assert_eq!(log.requests().len(), 2);
        assert!(matches!(totals.view(), View::Data(_)));

        session.load_expenses(&mut expenses, 2023).await;
        assert_eq!(log.requests().len(), 4);
        assert!(matches!(expenses.chart().view(), View::Empty));
        assert_eq!(expenses.chart().param(), Some(&2023));

        session.invalidate();
        session.load_totals(&mut totals, 2023).await;
        assert_eq!(log.requests().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_fetch_shows_alert() {
        let mut session = Session::new(Box::new(FailingBackend), HOUR);
        let mut chart = ExpenseChart::default();
        session.load_expenses(&mut chart, 2024).await;
        match chart.chart().view() {
            View::Alert(reason) => assert!(reason.contains("500")),
            other => panic!("expected an alert, got {other:?}"),
        }
        chart.select_quarter(Some(Quarter::Q3));
        assert!(chart.slice().is_none());
    }

    const SUPPLIES_2024: &str = r#"[
        {"entryType": "Expense", "datetime": "2024-02-15", "amount": 1000, "budgetItem": "Supplies"}
    ]"#;

    #[tokio::test]
    async fn test_unreadable_ceiling_keeps_the_chart() {
        let backend = TestBackend::empty()
            .with_records(2024, SUPPLIES_2024)
            .with_budget_items(2024, r#"[{"name": "Supplies", "proposedBudget": "TBD"}]"#);
        let mut session = Session::new(Box::new(backend), HOUR);
        let mut chart = ExpenseChart::default();
        session.load_expenses(&mut chart, 2024).await;
        let data = match chart.chart().view() {
            View::Data(data) => data,
            other => panic!("expected data, got {other:?}"),
        };
        assert_eq!(
            data.report.row("Supplies").unwrap().get(Quarter::Q1),
            Decimal::from(1000)
        );
        assert_eq!(data.report.diagnostics().unparsed_amounts, 1);
        chart.select_quarter(Some(Quarter::Q1));
        let q1 = chart.slice().unwrap();
        assert_eq!(q1.len(), 1);
        assert!(q1[0].proposed_budget.is_none());
    }

    #[tokio::test]
    async fn test_failed_budget_fetch_keeps_the_chart() {
        let backend = TestBackend::empty()
            .with_records(2024, SUPPLIES_2024)
            .with_budget_items(2024, "not json");
        let mut session = Session::new(Box::new(backend), HOUR);
        let mut chart = ExpenseChart::default();
        session.load_expenses(&mut chart, 2024).await;
        match chart.chart().view() {
            View::Data(data) => {
                assert!(data.budget.is_empty());
                assert_eq!(data.report.rows().len(), 1);
            }
            other => panic!("expected data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_summary() {
        let mut session = Session::new(Box::new(TestBackend::default()), HOUR);
        let mut chart = Chart::new("nutrition");
        let query = SummaryQuery {
            kind: SummaryKind::Nutrition,
            year: 2024,
            month: Some(1),
        };
        session.load_summary(&mut chart, query).await;
        match chart.view() {
            View::Data(counts) => assert_eq!(counts.rows().len(), 2),
            other => panic!("expected data, got {other:?}"),
        }
    }
}
