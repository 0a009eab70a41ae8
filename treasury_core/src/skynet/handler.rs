use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{TreasuryError, TreasuryResult};
use crate::helpers::retry::{with_retry, RetryPolicy};
use crate::skynet::dto::{
    BalanceItem, BalanceSummaryRequest, SearchTransfersRequest, TransfersByTxsRequest,
};
use crate::transfers::dto::TransferRecord;

pub const SEARCH_TRANSFERS_PATH: &str = "/skynet-tx-query/ronin/tokens/transfers/search";
pub const TRANSFERS_BY_TXS_PATH: &str = "/skynet/ronin/tokens/transfers/txs";
pub const BALANCE_SUMMARY_PATH: &str = "/skynet/ronin/tokens/balances/summary";

/// Client for the Ronin indexing gateway (transfer search, transaction lookup, balances).
#[derive(Clone)]
pub struct Skynet {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl Skynet {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> TreasuryResult<Self> {
        let client = Client::builder()
            .user_agent("treasury-scripts/0.1")
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> TreasuryResult<Self> {
        Self::new(
            config.skynet_url.clone(),
            config.api_key()?,
            config.request_timeout,
            config.retry.clone(),
        )
    }

    /// One page of transfers touching `address` within `[from_block, to_block]`.
    pub async fn search_transfers(
        &self,
        address: &str,
        from_block: u64,
        to_block: u64,
        limit: usize,
        offset: usize,
    ) -> TreasuryResult<Vec<TransferRecord>> {
        let payload = SearchTransfersRequest::new(address, from_block, to_block, limit, offset);
        let operation = format!(
            "search transfers {}..={} offset {}",
            from_block, to_block, offset
        );

        with_retry(&self.retry, &operation, || async {
            let body = self.post_json(SEARCH_TRANSFERS_PATH, &payload).await?;
            result_items(body, SEARCH_TRANSFERS_PATH)
        })
        .await
    }

    /// Every transfer leg of the given transactions.
    pub async fn transfers_by_txs(&self, hashes: &[String]) -> TreasuryResult<Vec<TransferRecord>> {
        let payload = TransfersByTxsRequest {
            transaction_hashes: hashes,
        };
        let operation = format!("lookup {} transactions", hashes.len());

        with_retry(&self.retry, &operation, || async {
            let body = self.post_json(TRANSFERS_BY_TXS_PATH, &payload).await?;
            result_items(body, TRANSFERS_BY_TXS_PATH)
        })
        .await
    }

    pub async fn balance_summary(&self, owner: &str) -> TreasuryResult<Vec<BalanceItem>> {
        let payload = BalanceSummaryRequest::new(owner);

        with_retry(&self.retry, "balance summary", || async {
            let body = self.post_json(BALANCE_SUMMARY_PATH, &payload).await?;
            result_items(body, BALANCE_SUMMARY_PATH)
        })
        .await
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> TreasuryResult<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("X-API-KEY", &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TreasuryError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| TreasuryError::Malformed(format!("{} returned non-JSON body: {}", path, e)))
    }
}

/// Pulls `result.items` out of a gateway response. A `null` list is an empty page;
/// anything else missing is malformed.
fn result_items<T: DeserializeOwned>(mut body: Value, endpoint: &str) -> TreasuryResult<Vec<T>> {
    let items = body
        .get_mut("result")
        .and_then(|result| result.get_mut("items"))
        .map(Value::take)
        .ok_or_else(|| TreasuryError::Malformed(format!("{} response has no result.items", endpoint)))?;

    match items {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => serde_json::from_value(items)
            .map_err(|e| TreasuryError::Malformed(format!("{} items did not parse: {}", endpoint, e))),
        other => Err(TreasuryError::Malformed(format!(
            "{} result.items is {} instead of a list",
            endpoint,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, retry: RetryPolicy) -> Skynet {
        Skynet::new(server.uri(), "test-key", Duration::from_secs(5), retry).unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_range_and_paging() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_TRANSFERS_PATH))
            .and(header("X-API-KEY", "test-key"))
            .and(body_partial_json(json!({
                "address": {"relateTo": "0xabc"},
                "block": {"blockRange": [10, 209]},
                "paging": {"limit": 200, "offset": 400, "pagingStyle": "offset"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"items": [{
                    "transactionHash": "0x1",
                    "tokenSymbol": "AXS",
                    "from": "0x2",
                    "to": "0xabc",
                    "value": "5",
                    "blockTime": 1704067200
                }]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = client(&server, RetryPolicy::none())
            .search_transfers("0xabc", 10, 209, 200, 400)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].transaction_hash, "0x1");
    }

    #[tokio::test]
    async fn test_missing_result_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TRANSFERS_BY_TXS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "quota"})))
            .mount(&server)
            .await;

        let err = client(&server, RetryPolicy::none())
            .transfers_by_txs(&["0x1".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, TreasuryError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_null_items_is_an_empty_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_TRANSFERS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": {"items": null}})),
            )
            .mount(&server)
            .await;

        let items = client(&server, RetryPolicy::none())
            .search_transfers("0xabc", 1, 2, 200, 0)
            .await
            .unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(BALANCE_SUMMARY_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(BALANCE_SUMMARY_PATH))
            .and(body_partial_json(json!({"ownerAddress": "0xabc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"items": [
                    {"tokenSymbol": "AXS", "balance": "3000000000000000000", "decimals": 18}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let items = client(&server, retry).balance_summary("0xabc").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].balance.as_deref(), Some("3000000000000000000"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_TRANSFERS_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };
        let err = client(&server, retry)
            .search_transfers("0xabc", 1, 2, 200, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, TreasuryError::Status { status: 401, .. }));
    }
}
