//! Pre-aggregated counts from the health summary endpoints.
//!
//! The backend does the counting. Nutritional status arrives as `{ status: { sex: count } }` and
//! vaccination status as `{ status: { age_group: count } }`; both are `GroupedCounts`, which the
//! client only flattens into one row per status.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Counts keyed by a status and then by a breakdown such as sex or age group.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedCounts(BTreeMap<String, BTreeMap<String, u64>>);

/// One flattened row of a `GroupedCounts`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CountRow {
    pub status: String,
    pub counts: BTreeMap<String, u64>,
    pub total: u64,
}

impl GroupedCounts {
    pub fn new(data: BTreeMap<String, BTreeMap<String, u64>>) -> Self {
        Self(data)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|breakdown| breakdown.is_empty())
    }

    /// All breakdown keys across every status, sorted. These become the columns of a chart.
    pub fn columns(&self) -> Vec<String> {
        self.0
            .values()
            .flat_map(|breakdown| breakdown.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One row per status. Breakdown keys missing from a status are filled with zero so every row
    /// has the same columns.
    pub fn rows(&self) -> Vec<CountRow> {
        let columns = self.columns();
        self.0
            .iter()
            .map(|(status, breakdown)| {
                let counts: BTreeMap<String, u64> = columns
                    .iter()
                    .map(|c| (c.clone(), breakdown.get(c).copied().unwrap_or_default()))
                    .collect();
                CountRow {
                    status: status.clone(),
                    total: counts.values().sum(),
                    counts,
                }
            })
            .collect()
    }
}
