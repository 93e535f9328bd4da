//! Quarterly aggregation of income and expense records.
//!
//! `ExpenseReport` groups Expense records by budget item with one sum per quarter.
//! `QuarterTotals` sums Income and Expense records per quarter. Both are pure functions of the
//! fetched records.

use crate::model::{
    Amount, BudgetItems, EntryType, IncomeExpenseRecord, Quarter, RawRecord, RecordError,
};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A record that was left out of a report, and why.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position of the record in the response.
    pub index: usize,
    pub error: RecordError,
}

/// What happened to the input while a report was built.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub skipped: Vec<SkippedRecord>,
    /// Amount fields that were present but not numbers. The record still counts using its
    /// other amount field.
    pub unparsed_amounts: usize,
}

/// Parses every record dated in `year`, collecting the ones that cannot be used in
/// `Diagnostics`.
pub(crate) fn parse_all(
    records: &[RawRecord],
    year: i32,
) -> (Vec<IncomeExpenseRecord>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let mut parsed = Vec::with_capacity(records.len());
    for (index, raw) in records.iter().enumerate() {
        let result = raw.parse().and_then(|record| {
            if record.date().year() == year {
                Ok(record)
            } else {
                Err(RecordError::OutsideYear(record.date()))
            }
        });
        match result {
            Ok(record) => {
                diagnostics.unparsed_amounts += record.unparsed_amounts();
                parsed.push(record);
            }
            Err(error) => {
                warn!("Skipping record {index}: {error}");
                diagnostics.skipped.push(SkippedRecord { index, error });
            }
        }
    }
    if diagnostics.unparsed_amounts > 0 {
        warn!(
            "{} amount field(s) could not be read as numbers",
            diagnostics.unparsed_amounts
        );
    }
    (parsed, diagnostics)
}

/// Per-quarter sums for one budget item. Quarters without a positive contribution have no entry.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuarterRow(BTreeMap<Quarter, Decimal>);

impl QuarterRow {
    pub fn get(&self, quarter: Quarter) -> Decimal {
        self.0.get(&quarter).copied().unwrap_or_default()
    }

    pub fn contains(&self, quarter: Quarter) -> bool {
        self.0.contains_key(&quarter)
    }

    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    fn add(&mut self, quarter: Quarter, amount: Decimal) {
        if amount > Decimal::ZERO {
            *self.0.entry(quarter).or_default() += amount;
        }
    }
}

/// One row of an `ExpenseReport` restricted to a single quarter.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct QuarterSliceRow {
    pub budget_item: String,
    pub amount: Decimal,
    /// The budget ceiling of the item, shown alongside the spend.
    pub proposed_budget: Option<Amount>,
}

/// Expense records grouped by budget item, one sum per quarter.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExpenseReport {
    rows: BTreeMap<String, QuarterRow>,
    diagnostics: Diagnostics,
}

impl ExpenseReport {
    /// Builds the report for `year`. Records that are not Expense records are ignored; records
    /// that cannot be parsed or are dated in another year are listed in `diagnostics`.
    pub fn build(records: &[RawRecord], year: i32) -> Self {
        let (parsed, diagnostics) = parse_all(records, year);
        let mut rows: BTreeMap<String, QuarterRow> = BTreeMap::new();
        for record in parsed
            .iter()
            .filter(|r| *r.entry_type() == EntryType::Expense)
        {
            rows.entry(record.budget_item().to_string())
                .or_default()
                .add(Quarter::from_date(record.date()), record.effective_amount());
        }
        debug!(
            "Built expense report with {} budget items from {} records",
            rows.len(),
            records.len()
        );
        Self { rows, diagnostics }
    }

    /// Every budget item that had at least one Expense record, including those that summed to
    /// zero.
    pub fn rows(&self) -> &BTreeMap<String, QuarterRow> {
        &self.rows
    }

    pub fn row(&self, budget_item: &str) -> Option<&QuarterRow> {
        self.rows.get(budget_item)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Adds unreadable amounts found outside the records, e.g. in the budget ceilings.
    pub(crate) fn add_unparsed_amounts(&mut self, count: usize) {
        self.diagnostics.unparsed_amounts += count;
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The budget items with a non-zero sum in `quarter`, annotated with their budget ceiling.
    pub fn slice(&self, quarter: Quarter, budget: &BudgetItems) -> Vec<QuarterSliceRow> {
        self.rows
            .iter()
            .filter(|(_, row)| row.contains(quarter))
            .map(|(name, row)| QuarterSliceRow {
                budget_item: name.clone(),
                amount: row.get(quarter),
                proposed_budget: budget.ceiling(name),
            })
            .collect()
    }
}

/// Income, expense and net for one quarter.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TotalsRow {
    pub quarter: Option<Quarter>,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Income and expense sums for each quarter of a year.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct QuarterTotals {
    rows: Vec<TotalsRow>,
    diagnostics: Diagnostics,
}

impl QuarterTotals {
    pub fn build(records: &[RawRecord], year: i32) -> Self {
        let (parsed, diagnostics) = parse_all(records, year);
        let mut rows: Vec<TotalsRow> = Quarter::ALL
            .iter()
            .map(|q| TotalsRow {
                quarter: Some(*q),
                ..TotalsRow::default()
            })
            .collect();
        let mut any = false;
        for record in &parsed {
            let row = &mut rows[Quarter::from_date(record.date()).index()];
            match record.entry_type() {
                EntryType::Income => row.income += record.effective_amount(),
                EntryType::Expense => row.expense += record.effective_amount(),
                EntryType::Other(_) => continue,
            }
            any = true;
        }
        for row in rows.iter_mut() {
            row.net = row.income - row.expense;
        }
        if !any {
            rows.clear();
        }
        Self { rows, diagnostics }
    }

    /// Four rows, Q1 to Q4, or none if there were no Income or Expense records.
    pub fn rows(&self) -> &[TotalsRow] {
        &self.rows
    }

    /// The sum of every quarter, with `quarter` set to `None`.
    pub fn year(&self) -> TotalsRow {
        let mut total = TotalsRow::default();
        for row in &self.rows {
            total.income += row.income;
            total.expense += row.expense;
        }
        total.net = total.income - total.expense;
        total
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
