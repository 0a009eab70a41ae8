use chrono::NaiveDate;
use serde::Deserialize;

use treasury_core::config::{AXS, WETH};
use treasury_core::transfers::dto::FeeCategory;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Which token and categories a page charts, and how its range behaves.
#[derive(Debug, Clone, Copy)]
pub struct InflowPage {
    pub symbol: &'static str,
    pub title: &'static str,
    pub categories: &'static [FeeCategory],
    /// Start date when the query gives none. `None` means the first day with data.
    pub default_start: Option<(i32, u32, u32)>,
    /// Running totals start at the first row ever, not at the range start.
    pub cumulative_from_origin: bool,
}

pub const AXS_PAGE: InflowPage = InflowPage {
    symbol: AXS.symbol,
    title: "AXS Daily Inflows and Accumulation",
    categories: &[
        FeeCategory::Ascending,
        FeeCategory::Breeding,
        FeeCategory::PartsEvol,
        FeeCategory::RunesCharmsMint,
    ],
    default_start: Some((2024, 1, 1)),
    cumulative_from_origin: true,
};

pub const WETH_PAGE: InflowPage = InflowPage {
    symbol: WETH.symbol,
    title: "WETH Daily Inflows and Accumulation",
    categories: &[FeeCategory::Marketplace],
    default_start: None,
    cumulative_from_origin: false,
};

impl InflowPage {
    pub fn default_start(&self) -> Option<NaiveDate> {
        self.default_start
            .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: FeeCategory,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayPoint {
    pub day: NaiveDate,
    /// Per category, in page order.
    pub daily: Vec<f64>,
    pub cumulative: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InflowView {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: f64,
    pub totals: Vec<CategoryTotal>,
    pub points: Vec<DayPoint>,
}
