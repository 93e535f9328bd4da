use anyhow::bail;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A three-month calendar bucket used for periodic financial reporting.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Quarter {
    #[serde(alias = "1", alias = "q1")]
    #[value(name = "Q1", alias = "1", alias = "q1")]
    Q1,
    #[serde(alias = "2", alias = "q2")]
    #[value(name = "Q2", alias = "2", alias = "q2")]
    Q2,
    #[serde(alias = "3", alias = "q3")]
    #[value(name = "Q3", alias = "3", alias = "q3")]
    Q3,
    #[serde(alias = "4", alias = "q4")]
    #[value(name = "Q4", alias = "4", alias = "q4")]
    Q4,
}

serde_plain::derive_display_from_serialize!(Quarter);
serde_plain::derive_fromstr_from_deserialize!(Quarter);

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Months 1-3 are Q1, 4-6 are Q2, 7-9 are Q3 and 10-12 are Q4.
    pub fn from_month(month: u32) -> crate::error::Res<Self> {
        Ok(match (month + 2) / 3 {
            1 => Quarter::Q1,
            2 => Quarter::Q2,
            3 => Quarter::Q3,
            4 => Quarter::Q4,
            _ => bail!("Month {month} is out of range"),
        })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        match date.month0() / 3 {
            0 => Quarter::Q1,
            1 => Quarter::Q2,
            2 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    /// Zero-based position, for indexing into per-quarter arrays.
    pub fn index(self) -> usize {
        match self {
            Quarter::Q1 => 0,
            Quarter::Q2 => 1,
            Quarter::Q3 => 2,
            Quarter::Q4 => 3,
        }
    }
}
