use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::helpers::amounts::scale_amount;
use crate::helpers::dates::wrapped_date;
use crate::skynet::dto::BalanceItem;

/// USD price per tracked token symbol at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySnapshot {
    #[serde(with = "wrapped_date")]
    pub timestamp: DateTime<Utc>,
    pub prices: BTreeMap<String, f64>,
}

impl CurrencySnapshot {
    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub token_symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(rename = "std_value", default)]
    pub std_value: Option<f64>,
}

impl From<BalanceItem> for BalanceEntry {
    fn from(item: BalanceItem) -> Self {
        let std_value = match (item.balance.as_deref(), item.decimals) {
            (Some(balance), Some(decimals)) => scale_amount(balance, decimals),
            _ => None,
        };

        Self {
            token_symbol: item.token_symbol,
            contract_address: item.contract_address,
            balance: item.balance,
            decimals: item.decimals,
            std_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    #[serde(with = "wrapped_date")]
    pub timestamp: DateTime<Utc>,
    pub owner: String,
    pub items: Vec<BalanceEntry>,
}

impl BalanceSnapshot {
    /// Scaled balance of `symbol`, zero when the wallet holds none.
    pub fn scaled_balance(&self, symbol: &str) -> f64 {
        self.items
            .iter()
            .filter(|item| item.token_symbol == symbol)
            .filter_map(|item| item.std_value)
            .sum()
    }
}
