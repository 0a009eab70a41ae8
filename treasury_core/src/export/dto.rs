use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::dto::DailyAggregate;
use crate::helpers::dates::{day_start, wrapped_date};

pub const FRONTEND_DATA_FILE: &str = "frontend_data.json";
pub const CURRENCY_FILE: &str = "currency.json";
pub const BALANCE_FILE: &str = "balance.json";

/// Daily row as the dashboard reads it: the day's midnight as a wrapped date,
/// the same instant in unix seconds, and the numeric series fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDailyRow {
    #[serde(with = "wrapped_date")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub date: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

impl ExportedDailyRow {
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn value(&self, field: &str) -> f64 {
        self.fields.get(field).copied().unwrap_or(0.0)
    }
}

impl From<&DailyAggregate> for ExportedDailyRow {
    fn from(row: &DailyAggregate) -> Self {
        Self {
            timestamp: day_start(row.day),
            date: row.date,
            fields: row.fields.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub frontend_rows: usize,
    pub currency_snapshots: usize,
    pub balance_snapshots: usize,
}
