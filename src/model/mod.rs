//! Types that represent the data returned by the barangay backend, such as
//! `IncomeExpenseRecord`, `BudgetItems` and `GroupedCounts`.
mod amount;
mod budget;
mod counts;
mod quarter;
mod record;

pub use amount::{Amount, AmountError, AmountFormat};
pub use budget::{BudgetItem, BudgetItems, RawBudgetItem};
pub use counts::{CountRow, GroupedCounts};
pub use quarter::Quarter;
pub use record::{EntryType, IncomeExpenseRecord, RawRecord, RecordError};
