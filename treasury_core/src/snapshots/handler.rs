use std::collections::BTreeMap;

use chrono::Utc;

use crate::coingecko::handler::CoinGecko;
use crate::config::TRACKED_TOKENS;
use crate::error::{TreasuryError, TreasuryResult};
use crate::skynet::handler::Skynet;
use crate::snapshots::dto::{BalanceEntry, BalanceSnapshot, CurrencySnapshot};
use crate::snapshots::storage::SnapshotStorage;

/// Fetches USD prices for every tracked token and appends one snapshot.
/// Nothing is stored unless every token got a price.
pub async fn capture_currency(
    coingecko: &CoinGecko,
    snapshots: &SnapshotStorage,
) -> TreasuryResult<CurrencySnapshot> {
    let ids: Vec<&str> = TRACKED_TOKENS.iter().map(|token| token.coingecko_id).collect();
    let quotes = coingecko.usd_prices(&ids).await?;

    let mut prices = BTreeMap::new();
    for token in TRACKED_TOKENS {
        let price = quotes.get(token.coingecko_id).copied().ok_or_else(|| {
            TreasuryError::Malformed(format!("no price for {}", token.symbol))
        })?;
        prices.insert(token.symbol.to_string(), price);
    }

    let snapshot = CurrencySnapshot {
        timestamp: Utc::now(),
        prices,
    };
    snapshots.append_currency(&snapshot)?;
    log::info!("Stored currency snapshot: {:?}", snapshot.prices);

    Ok(snapshot)
}

/// Fetches the wallet's balance summary and appends it with scaled balances.
pub async fn capture_balance(
    skynet: &Skynet,
    snapshots: &SnapshotStorage,
    owner: &str,
) -> TreasuryResult<BalanceSnapshot> {
    let items = skynet.balance_summary(owner).await?;

    let snapshot = BalanceSnapshot {
        timestamp: Utc::now(),
        owner: owner.to_lowercase(),
        items: items.into_iter().map(BalanceEntry::from).collect(),
    };
    snapshots.append_balance(&snapshot)?;
    log::info!(
        "Stored balance snapshot for {} with {} tokens",
        snapshot.owner,
        snapshot.items.len()
    );

    Ok(snapshot)
}
