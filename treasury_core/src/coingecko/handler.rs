use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;

use crate::coingecko::dto::{SimplePriceResponse, USD};
use crate::config::Config;
use crate::error::{TreasuryError, TreasuryResult};
use crate::helpers::retry::{with_retry, RetryPolicy};

pub const SIMPLE_PRICE_PATH: &str = "/simple/price";

#[derive(Clone)]
pub struct CoinGecko {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl CoinGecko {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> TreasuryResult<Self> {
        let client = Client::builder()
            .user_agent("treasury-scripts/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> TreasuryResult<Self> {
        Self::new(
            config.coingecko_url.clone(),
            config.request_timeout,
            config.retry.clone(),
        )
    }

    /// USD price per coin id. Every requested id must be present in the answer.
    pub async fn usd_prices(&self, ids: &[&str]) -> TreasuryResult<HashMap<String, f64>> {
        let joined = ids.join(",");
        let url = format!("{}{}", self.base_url, SIMPLE_PRICE_PATH);

        let body: SimplePriceResponse = with_retry(&self.retry, "coingecko simple price", || async {
            let response = self
                .client
                .get(&url)
                .query(&[("ids", joined.as_str()), ("vs_currencies", USD)])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TreasuryError::Status {
                    endpoint: SIMPLE_PRICE_PATH.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let text = response.text().await?;
            serde_json::from_str::<SimplePriceResponse>(&text).map_err(|e| {
                TreasuryError::Malformed(format!("{} did not parse: {}", SIMPLE_PRICE_PATH, e))
            })
        })
        .await?;

        let mut prices = HashMap::with_capacity(ids.len());
        for id in ids {
            let price = body
                .get(*id)
                .and_then(|quotes| quotes.get(USD))
                .copied()
                .ok_or_else(|| TreasuryError::Malformed(format!("no usd price for `{}`", id)))?;
            prices.insert(id.to_string(), price);
        }

        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CoinGecko {
        CoinGecko::new(server.uri(), Duration::from_secs(5), RetryPolicy::none()).unwrap()
    }

    #[tokio::test]
    async fn test_usd_prices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SIMPLE_PRICE_PATH))
            .and(query_param("ids", "axie-infinity,ethereum"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "axie-infinity": {"usd": 7.25},
                "ethereum": {"usd": 3120.5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prices = client(&server)
            .usd_prices(&["axie-infinity", "ethereum"])
            .await
            .unwrap();

        assert_eq!(prices["axie-infinity"], 7.25);
        assert_eq!(prices["ethereum"], 3120.5);
    }

    #[tokio::test]
    async fn test_missing_coin_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SIMPLE_PRICE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "axie-infinity": {"usd": 7.25}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .usd_prices(&["axie-infinity", "ethereum"])
            .await
            .unwrap_err();

        assert!(matches!(err, TreasuryError::Malformed(_)));
    }
}
