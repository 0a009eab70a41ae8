use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{AXS, WETH};
use crate::helpers::dates::day_start_timestamp;
use crate::transfers::dto::FeeCategory;

/// One day of the dashboard series: `{token}_{category}` -> summed scaled amount.
/// Pairs with no inflow that day are absent, and readers treat them as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub day: NaiveDate,
    /// Unix seconds of the day's 00:00 UTC.
    pub date: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

impl DailyAggregate {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            date: day_start_timestamp(day),
            fields: BTreeMap::new(),
        }
    }

    pub fn value(&self, field: &str) -> f64 {
        self.fields.get(field).copied().unwrap_or(0.0)
    }
}

pub fn field_name(token_symbol: &str, category: FeeCategory) -> String {
    format!("{}_{}", token_symbol.to_lowercase(), category.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub wallet: String,
    pub tokens: Vec<String>,
    pub categories: Vec<FeeCategory>,
    /// Transfers at or above this scaled amount are left out (treasury movements, not fees).
    pub max_scaled_amount: Option<f64>,
}

impl AggregateOptions {
    pub fn treasury_defaults(wallet: &str) -> Self {
        Self {
            wallet: wallet.to_lowercase(),
            tokens: vec![WETH.symbol.to_string(), AXS.symbol.to_string()],
            categories: FeeCategory::AGGREGATED.to_vec(),
            max_scaled_amount: None,
        }
    }

    /// Every field name this run writes, present on a day or not.
    pub fn owned_fields(&self) -> BTreeSet<String> {
        self.tokens
            .iter()
            .flat_map(|token| {
                self.categories
                    .iter()
                    .map(move |category| field_name(token, *category))
            })
            .collect()
    }

    /// WETH marketplace series over the historical range, ignoring transfers of 50 WETH or more.
    pub fn weth_history(wallet: &str) -> Self {
        Self {
            wallet: wallet.to_lowercase(),
            tokens: vec![WETH.symbol.to_string()],
            categories: vec![FeeCategory::Marketplace],
            max_scaled_amount: Some(50.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub days: usize,
    pub records_used: usize,
    /// Matching token/category/recipient but no scaled amount yet.
    pub unnormalized: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names() {
        assert_eq!(field_name("AXS", FeeCategory::Breeding), "axs_breeding");
        assert_eq!(field_name("WETH", FeeCategory::RunesCharmsMint), "weth_r&cMint");
    }

    #[test]
    fn test_row_json_shape() {
        let mut row = DailyAggregate::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        row.fields.insert("axs_breeding".to_string(), 1.5);

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(
            value,
            json!({"day": "2024-01-02", "date": 1704153600, "axs_breeding": 1.5})
        );

        let back: DailyAggregate = serde_json::from_value(value).unwrap();
        assert_eq!(back, row);
        assert_eq!(back.value("weth_marketplace"), 0.0);
    }
}
