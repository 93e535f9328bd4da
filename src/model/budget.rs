use crate::model::record::parse_amount;
use crate::model::Amount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// A row of the barangay's budget plan. Only used as a lookup from budget item name to its
/// budget ceiling.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub name: String,
    #[serde(default)]
    pub proposed_budget: Option<Amount>,
}

/// A budget item as sent by the backend. The ceiling is read when the items are collected, so one
/// unreadable ceiling cannot fail the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBudgetItem {
    pub name: String,
    #[serde(default)]
    pub proposed_budget: Option<Value>,
}

/// Budget items keyed by name.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RawBudgetItem>", into = "Vec<BudgetItem>")]
pub struct BudgetItems {
    data: BTreeMap<String, Option<Amount>>,
    /// Ceilings that were present but not numbers. Those items have no ceiling.
    unparsed_ceilings: usize,
}

impl BudgetItems {
    /// The budget ceiling for `name`, if the item exists and has one.
    pub fn ceiling(&self, name: &str) -> Option<Amount> {
        self.data.get(name).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn unparsed_ceilings(&self) -> usize {
        self.unparsed_ceilings
    }

    pub fn iter(&self) -> impl Iterator<Item = BudgetItem> + '_ {
        self.data.iter().map(|(name, proposed_budget)| BudgetItem {
            name: name.clone(),
            proposed_budget: *proposed_budget,
        })
    }
}

impl From<Vec<RawBudgetItem>> for BudgetItems {
    /// Names are trimmed. When a name repeats, the last item wins.
    fn from(items: Vec<RawBudgetItem>) -> Self {
        let mut unparsed_ceilings = 0;
        let mut data = BTreeMap::new();
        for item in items {
            let name = item.name.trim().to_string();
            let ceiling = match parse_amount(&item.proposed_budget) {
                Ok(ceiling) => ceiling,
                Err(()) => {
                    warn!("The proposed budget of '{name}' is not a number");
                    unparsed_ceilings += 1;
                    None
                }
            };
            data.insert(name, ceiling);
        }
        Self {
            data,
            unparsed_ceilings,
        }
    }
}

impl From<BudgetItems> for Vec<BudgetItem> {
    fn from(items: BudgetItems) -> Self {
        items.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_budget_items_lookup() {
        let json = r#"[
            {"name": "Supplies", "proposedBudget": "50,000.00"},
            {"name": "Travel ", "proposedBudget": 12000},
            {"name": "Misc"}
        ]"#;
        let items: BudgetItems = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(
            items.ceiling("Supplies").unwrap().value(),
            Decimal::from_str("50000").unwrap()
        );
        assert_eq!(
            items.ceiling("Travel").unwrap().value(),
            Decimal::from(12000)
        );
        assert!(items.ceiling("Misc").is_none());
        assert!(items.ceiling("Unknown").is_none());
        assert_eq!(items.unparsed_ceilings(), 0);
    }

    #[test]
    fn test_unreadable_ceiling_is_counted() {
        let json = r#"[
            {"name": "Supplies", "proposedBudget": "TBD"},
            {"name": "Fuel", "proposedBudget": ["x"]},
            {"name": "Travel", "proposedBudget": "1,500"}
        ]"#;
        let items: BudgetItems = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.ceiling("Supplies").is_none());
        assert!(items.ceiling("Fuel").is_none());
        assert_eq!(items.ceiling("Travel").unwrap().value(), Decimal::from(1500));
        assert_eq!(items.unparsed_ceilings(), 2);
    }

    #[test]
    fn test_serialized_items_read_back() {
        let json = r#"[{"name": "Supplies", "proposedBudget": "₱2,000.00"}]"#;
        let items: BudgetItems = serde_json::from_str(json).unwrap();
        let back: BudgetItems =
            serde_json::from_str(&serde_json::to_string(&items).unwrap()).unwrap();
        assert_eq!(back, items);
    }
}
