//! Income and expense records from the treasurer's tracking endpoint.
//!
//! Records arrive as `RawRecord`, where every field is optional and loosely typed. `RawRecord::parse`
//! is the explicit step that turns one into an `IncomeExpenseRecord` or says why it cannot.

use crate::model::Amount;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Philippine Standard Time, UTC+8. Timestamps with an offset are bucketed by their local date.
const PHT_OFFSET_SECS: i32 = 8 * 3600;

/// Whether a record is money coming in or going out.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Income,
    Expense,
    /// Any other discriminator sent by the backend. Never counted in a report.
    Other(String),
}

impl From<&str> for EntryType {
    /// The discriminator is matched exactly: `"expense"` is `Other`, not `Expense`.
    fn from(s: &str) -> Self {
        match s {
            "Income" => EntryType::Income,
            "Expense" => EntryType::Expense,
            other => EntryType::Other(other.to_string()),
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Income => f.write_str("Income"),
            EntryType::Expense => f.write_str("Expense"),
            EntryType::Other(s) => f.write_str(s),
        }
    }
}

/// A record as it is sent by the backend. Nothing is validated here, so one malformed record
/// cannot fail the deserialization of a whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub entry_type: Option<Value>,
    #[serde(default)]
    pub datetime: Option<Value>,
    /// The proposed amount.
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub actual_amount: Option<Value>,
    #[serde(default, alias = "category")]
    pub budget_item: Option<Value>,
}

/// The reason a `RawRecord` could not be parsed.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum RecordError {
    MissingEntryType,
    MissingDatetime,
    InvalidDatetime(String),
    MissingBudgetItem,
    /// The record is dated outside the year that was requested.
    OutsideYear(NaiveDate),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::MissingEntryType => f.write_str("the entry type is missing"),
            RecordError::MissingDatetime => f.write_str("the datetime is missing"),
            RecordError::InvalidDatetime(s) => write!(f, "the datetime '{s}' cannot be parsed"),
            RecordError::MissingBudgetItem => f.write_str("the budget item is missing"),
            RecordError::OutsideYear(date) => {
                write!(f, "the date {date} is outside the requested year")
            }
        }
    }
}

impl std::error::Error for RecordError {}

/// A validated income or expense record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct IncomeExpenseRecord {
    entry_type: EntryType,
    date: NaiveDate,
    amount: Option<Amount>,
    actual_amount: Option<Amount>,
    budget_item: String,
    /// The number of amount fields that were present but could not be read as numbers.
    unparsed_amounts: usize,
}

impl IncomeExpenseRecord {
    pub fn new(
        entry_type: EntryType,
        date: NaiveDate,
        amount: Option<Amount>,
        actual_amount: Option<Amount>,
        budget_item: impl Into<String>,
    ) -> Self {
        Self {
            entry_type,
            date,
            amount,
            actual_amount,
            budget_item: budget_item.into(),
            unparsed_amounts: 0,
        }
    }

    pub fn entry_type(&self) -> &EntryType {
        &self.entry_type
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn budget_item(&self) -> &str {
        &self.budget_item
    }

    pub fn unparsed_amounts(&self) -> usize {
        self.unparsed_amounts
    }

    /// The actual amount if it is positive, otherwise the proposed amount if it is positive,
    /// otherwise zero.
    pub fn effective_amount(&self) -> Decimal {
        [self.actual_amount, self.amount]
            .into_iter()
            .flatten()
            .find(Amount::is_positive)
            .map(|a| a.value())
            .unwrap_or(Decimal::ZERO)
    }
}

impl RawRecord {
    /// Validates this record. Amount fields that cannot be read are treated as absent and
    /// counted in `unparsed_amounts`; every other problem is an error.
    pub fn parse(&self) -> Result<IncomeExpenseRecord, RecordError> {
        let entry_type = text(&self.entry_type)
            .map(|s| EntryType::from(s.as_str()))
            .ok_or(RecordError::MissingEntryType)?;
        let datetime = text(&self.datetime).ok_or(RecordError::MissingDatetime)?;
        let date = parse_date(&datetime)
            .ok_or_else(|| RecordError::InvalidDatetime(datetime.to_string()))?;
        let budget_item = text(&self.budget_item).ok_or(RecordError::MissingBudgetItem)?;

        let mut unparsed_amounts = 0;
        let mut amount_field = |v: &Option<Value>| match parse_amount(v) {
            Ok(a) => a,
            Err(()) => {
                unparsed_amounts += 1;
                None
            }
        };
        let amount = amount_field(&self.amount);
        let actual_amount = amount_field(&self.actual_amount);

        Ok(IncomeExpenseRecord {
            entry_type,
            date,
            amount,
            actual_amount,
            budget_item,
            unparsed_amounts,
        })
    }
}

/// Returns the trimmed string form of a field, or `None` if it is missing, null or blank.
fn text(v: &Option<Value>) -> Option<String> {
    let s = match v.as_ref()? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// `Ok(None)` for a missing, null or blank amount, `Err(())` for something that is not a number.
pub(crate) fn parse_amount(v: &Option<Value>) -> Result<Option<Amount>, ()> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value @ (Value::String(_) | Value::Number(_))) => {
            Amount::deserialize(value).map(Some).map_err(|_| ())
        }
        Some(_) => Err(()),
    }
}

/// Accepts RFC 3339 timestamps, naive timestamps with a `T` or space separator, and plain dates.
/// RFC 3339 timestamps are converted to Philippine time first.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        let pht = FixedOffset::east_opt(PHT_OFFSET_SECS)?;
        return Some(dt.with_timezone(&pht).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: Value) -> RawRecord {
        serde_json::from_value(v).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_full_record() {
        let r = raw(json!({
            "entryType": "Expense",
            "datetime": "2024-02-15T08:30:00+08:00",
            "amount": "1,000.00",
            "actualAmount": 750,
            "budgetItem": "Supplies"
        }))
        .parse()
        .unwrap();
        assert_eq!(r.entry_type(), &EntryType::Expense);
        assert_eq!(r.date(), NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(r.budget_item(), "Supplies");
        assert_eq!(r.effective_amount(), dec("750"));
        assert_eq!(r.unparsed_amounts(), 0);
    }

    #[test]
    fn test_date_formats() {
        for s in [
            "2024-05-01",
            "2024-05-01T00:00:00",
            "2024-05-01 13:45:10",
            "2024-05-01T13:45:10.123456Z",
        ] {
            assert_eq!(
                parse_date(s),
                NaiveDate::from_ymd_opt(2024, 5, 1),
                "failed to parse {s}"
            );
        }
        assert_eq!(parse_date("May 1, 2024"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_invalid_datetime_is_an_error() {
        let err = raw(json!({
            "entryType": "Expense",
            "datetime": "not a date",
            "amount": 10,
            "budgetItem": "Supplies"
        }))
        .parse()
        .unwrap_err();
        assert_eq!(err, RecordError::InvalidDatetime("not a date".into()));
    }

    #[test]
    fn test_missing_fields() {
        let err = raw(json!({"datetime": "2024-01-01", "budgetItem": "X"}))
            .parse()
            .unwrap_err();
        assert_eq!(err, RecordError::MissingEntryType);
        let err = raw(json!({"entryType": "Expense", "budgetItem": "X"}))
            .parse()
            .unwrap_err();
        assert_eq!(err, RecordError::MissingDatetime);
        let err = raw(json!({"entryType": "Expense", "datetime": "2024-01-01", "budgetItem": " "}))
            .parse()
            .unwrap_err();
        assert_eq!(err, RecordError::MissingBudgetItem);
    }

    #[test]
    fn test_effective_amount_falls_back_to_proposed() {
        let r = raw(json!({
            "entryType": "Expense",
            "datetime": "2024-01-01",
            "amount": 300,
            "actualAmount": "-5",
            "budgetItem": "X"
        }))
        .parse()
        .unwrap();
        assert_eq!(r.effective_amount(), dec("300"));
    }

    #[test]
    fn test_unparseable_actual_amount_falls_back_and_is_counted() {
        let r = raw(json!({
            "entryType": "Expense",
            "datetime": "2024-01-01",
            "amount": "300",
            "actualAmount": "pending",
            "budgetItem": "X"
        }))
        .parse()
        .unwrap();
        assert_eq!(r.effective_amount(), dec("300"));
        assert_eq!(r.unparsed_amounts(), 1);
    }

    #[test]
    fn test_effective_amount_zero_when_both_non_positive() {
        let r = raw(json!({
            "entryType": "Expense",
            "datetime": "2024-01-01",
            "amount": 0,
            "actualAmount": null,
            "budgetItem": "X"
        }))
        .parse()
        .unwrap();
        assert_eq!(r.effective_amount(), Decimal::ZERO);
        assert_eq!(r.unparsed_amounts(), 0);
    }

    #[test]
    fn test_entry_type_from_str() {
        assert_eq!(EntryType::from("Income"), EntryType::Income);
        assert_eq!(EntryType::from("Expense"), EntryType::Expense);
        assert_eq!(
            EntryType::from("Transfer"),
            EntryType::Other("Transfer".into())
        );
    }

    #[test]
    fn test_entry_type_is_case_sensitive() {
        assert_eq!(EntryType::from("expense"), EntryType::Other("expense".into()));
        assert_eq!(EntryType::from("EXPENSE"), EntryType::Other("EXPENSE".into()));
        let r = raw(json!({
            "entryType": " expense ",
            "datetime": "2024-01-01",
            "amount": 10,
            "budgetItem": "X"
        }))
        .parse()
        .unwrap();
        assert_eq!(r.entry_type(), &EntryType::Other("expense".into()));
    }

    #[test]
    fn test_entry_type_from_json_string() {
        let r = raw(json!({
            "entryType": "Income",
            "datetime": "2024-01-01",
            "amount": 10,
            "budgetItem": "X"
        }))
        .parse()
        .unwrap();
        assert_eq!(r.entry_type(), &EntryType::Income);
    }

    #[test]
    fn test_utc_timestamp_uses_philippine_date() {
        assert_eq!(
            parse_date("2023-12-31T16:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            parse_date("2024-03-31T15:59:59Z"),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
        assert_eq!(
            parse_date("2024-03-31T16:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 4, 1)
        );
    }
}
