use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helpers::amounts::string_or_number;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFilter {
    pub relate_to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFilter {
    pub block_range: [u64; 2],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub limit: usize,
    pub offset: usize,
    pub paging_style: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchTransfersRequest {
    pub address: AddressFilter,
    pub block: BlockFilter,
    pub paging: Paging,
}

impl SearchTransfersRequest {
    pub fn new(address: &str, from_block: u64, to_block: u64, limit: usize, offset: usize) -> Self {
        Self {
            address: AddressFilter {
                relate_to: address.to_string(),
            },
            block: BlockFilter {
                block_range: [from_block, to_block],
            },
            paging: Paging {
                limit,
                offset,
                paging_style: "offset",
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransfersByTxsRequest<'a> {
    pub transaction_hashes: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummaryRequest {
    pub includes: Vec<&'static str>,
    pub owner_address: String,
    pub token_standards: Vec<&'static str>,
}

impl BalanceSummaryRequest {
    pub fn new(owner: &str) -> Self {
        Self {
            includes: vec!["RON"],
            owner_address: owner.to_string(),
            token_standards: vec!["ERC20", "ERC721", "ERC1155"],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceItem {
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub balance: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
