//! Transforms fetched records into chart-ready reports and renders them.
//!
//! - `quarterly` builds the per-quarter expense and income/expense reports.
//! - `chart` tracks the loading state of each chart.
//! - `session` fetches through the query cache and drives the charts.
//! - `render` turns reports into tables, CSV or JSON.

mod chart;
mod quarterly;
mod render;
mod session;

pub use chart::{Chart, ChartData, ChartState, View};
pub use quarterly::{
    Diagnostics, ExpenseReport, QuarterRow, QuarterSliceRow, QuarterTotals, SkippedRecord,
    TotalsRow,
};
pub use render::{render, OutputFormat, Table};
pub use session::{ExpenseChart, ExpenseChartData, Session};

use crate::model::{Amount, BudgetItems, GroupedCounts, Quarter};
use rust_decimal::Decimal;

impl ChartData for ExpenseReport {
    fn is_empty(&self) -> bool {
        ExpenseReport::is_empty(self)
    }
}

impl ChartData for QuarterTotals {
    fn is_empty(&self) -> bool {
        QuarterTotals::is_empty(self)
    }
}

impl ChartData for GroupedCounts {
    fn is_empty(&self) -> bool {
        GroupedCounts::is_empty(self)
    }
}

impl ChartData for BudgetItems {
    fn is_empty(&self) -> bool {
        BudgetItems::is_empty(self)
    }
}

fn money(d: Decimal) -> String {
    Amount::new(d).to_string()
}

fn ceiling(a: Option<Amount>) -> String {
    a.map(|a| Amount::new(a.value()).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Every budget item with all four quarters. Quarters without spending show `-`.
pub fn expense_table(report: &ExpenseReport, budget: &BudgetItems) -> Table {
    let mut table = Table::new([
        "Budget Item",
        "Q1",
        "Q2",
        "Q3",
        "Q4",
        "Total",
        "Proposed Budget",
    ]);
    for (name, row) in report.rows() {
        let mut cells = vec![name.clone()];
        for q in Quarter::ALL {
            cells.push(if row.contains(q) {
                money(row.get(q))
            } else {
                "-".to_string()
            });
        }
        cells.push(money(row.total()));
        cells.push(ceiling(budget.ceiling(name)));
        table.push(cells);
    }
    table
}

/// The budget items with spending in one quarter.
pub fn slice_table(quarter: Quarter, rows: &[QuarterSliceRow]) -> Table {
    let mut table = Table::new([
        "Budget Item".to_string(),
        quarter.to_string(),
        "Proposed Budget".to_string(),
    ]);
    for row in rows {
        table.push([
            row.budget_item.clone(),
            money(row.amount),
            ceiling(row.proposed_budget),
        ]);
    }
    table
}

/// Income, expense and net per quarter, followed by the year's total.
pub fn totals_table(totals: &QuarterTotals) -> Table {
    let mut table = Table::new(["Quarter", "Income", "Expense", "Net"]);
    let year = totals.year();
    for row in totals.rows().iter().chain(std::iter::once(&year)) {
        let label = row
            .quarter
            .map(|q| q.to_string())
            .unwrap_or_else(|| "Total".to_string());
        table.push([label, money(row.income), money(row.expense), money(row.net)]);
    }
    table
}

/// One row per status with a column per breakdown key and a total.
pub fn counts_table(label: &str, counts: &GroupedCounts) -> Table {
    let mut headers = vec![label.to_string()];
    headers.extend(counts.columns());
    headers.push("Total".to_string());
    let mut table = Table::new(headers);
    for row in counts.rows() {
        let mut cells = vec![row.status];
        cells.extend(row.counts.values().map(u64::to_string));
        cells.push(row.total.to_string());
        table.push(cells);
    }
    table
}

pub fn budget_table(budget: &BudgetItems) -> Table {
    let mut table = Table::new(["Budget Item", "Proposed Budget"]);
    for item in budget.iter() {
        table.push([item.name, ceiling(item.proposed_budget)]);
    }
    table
}
