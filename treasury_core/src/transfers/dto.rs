use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::amounts::string_or_number;

/// Business meaning of a transaction that paid into the treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeeCategory {
    #[serde(rename = "marketplace")]
    Marketplace,
    #[serde(rename = "breeding")]
    Breeding,
    #[serde(rename = "ascending")]
    Ascending,
    #[serde(rename = "partsEvol")]
    PartsEvol,
    #[serde(rename = "r&cMint")]
    RunesCharmsMint,
    #[serde(rename = "unknown")]
    Unknown,
}

impl FeeCategory {
    pub const ALL: [FeeCategory; 6] = [
        FeeCategory::Marketplace,
        FeeCategory::Breeding,
        FeeCategory::Ascending,
        FeeCategory::PartsEvol,
        FeeCategory::RunesCharmsMint,
        FeeCategory::Unknown,
    ];

    /// Categories that end up in the daily series. `unknown` never does.
    pub const AGGREGATED: [FeeCategory; 5] = [
        FeeCategory::Marketplace,
        FeeCategory::Breeding,
        FeeCategory::Ascending,
        FeeCategory::PartsEvol,
        FeeCategory::RunesCharmsMint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeCategory::Marketplace => "marketplace",
            FeeCategory::Breeding => "breeding",
            FeeCategory::Ascending => "ascending",
            FeeCategory::PartsEvol => "partsEvol",
            FeeCategory::RunesCharmsMint => "r&cMint",
            FeeCategory::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FeeCategory::Marketplace => "Marketplace",
            FeeCategory::Breeding => "Breeding",
            FeeCategory::Ascending => "Ascension",
            FeeCategory::PartsEvol => "Parts Evolution",
            FeeCategory::RunesCharmsMint => "R&C Mint",
            FeeCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeeCategory::ALL
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown fee category `{}`", s))
    }
}

/// One leg of one transaction touching the treasury, as returned by the indexing API.
///
/// Fields the API sends that are not modelled here are kept in `extra` so a stored
/// record never loses data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub transaction_hash: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default, deserialize_with = "string_or_number", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub block_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_type: Option<FeeCategory>,
    #[serde(rename = "std_value", default, skip_serializing_if = "Option::is_none")]
    pub std_value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransferRecord {
    pub fn is_to(&self, address: &str) -> bool {
        self.to.eq_ignore_ascii_case(address)
    }
}
