use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};

use crate::error::TreasuryResult;
use crate::snapshots::dto::{BalanceSnapshot, CurrencySnapshot};

const CURRENCY_TREE: &str = "currency";
const BALANCE_TREE: &str = "balance";

/// Append-only snapshot collections. Keys come from `generate_id`, so the last
/// entry is the most recent capture.
#[derive(Clone)]
pub struct SnapshotStorage {
    db: Db,
    currency: Tree,
    balance: Tree,
}

impl SnapshotStorage {
    pub fn new(db: &Db) -> sled::Result<Self> {
        Ok(Self {
            db: db.clone(),
            currency: db.open_tree(CURRENCY_TREE)?,
            balance: db.open_tree(BALANCE_TREE)?,
        })
    }

    pub fn append_currency(&self, snapshot: &CurrencySnapshot) -> TreasuryResult<u64> {
        self.append(&self.currency, snapshot)
    }

    pub fn append_balance(&self, snapshot: &BalanceSnapshot) -> TreasuryResult<u64> {
        self.append(&self.balance, snapshot)
    }

    pub fn latest_currency(&self) -> TreasuryResult<Option<CurrencySnapshot>> {
        latest(&self.currency)
    }

    pub fn latest_balance(&self) -> TreasuryResult<Option<BalanceSnapshot>> {
        latest(&self.balance)
    }

    pub fn currency(&self) -> TreasuryResult<Vec<CurrencySnapshot>> {
        list(&self.currency)
    }

    pub fn balances(&self) -> TreasuryResult<Vec<BalanceSnapshot>> {
        list(&self.balance)
    }

    fn append<T: Serialize>(&self, tree: &Tree, snapshot: &T) -> TreasuryResult<u64> {
        let id = self.db.generate_id()?;
        tree.insert(id.to_be_bytes(), serde_json::to_vec(snapshot)?)?;
        Ok(id)
    }
}

fn latest<T: DeserializeOwned>(tree: &Tree) -> TreasuryResult<Option<T>> {
    match tree.last()? {
        Some((_, value)) => Ok(Some(serde_json::from_slice(&value)?)),
        None => Ok(None),
    }
}

fn list<T: DeserializeOwned>(tree: &Tree) -> TreasuryResult<Vec<T>> {
    let mut out = Vec::with_capacity(tree.len());
    for entry in tree.iter() {
        let (_, value) = entry?;
        out.push(serde_json::from_slice(&value)?);
    }
    Ok(out)
}
