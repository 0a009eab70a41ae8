use chrono::Utc;
use sled::{Db, Tree};

use crate::error::TreasuryResult;
use crate::ledger::dto::{FailedUnit, FailureEntry};

const FAILURE_LEDGER_TREE: &str = "failure_ledger";

/// Persistent record of windows and batches that were skipped, so a run that
/// "finished" can still be known to be incomplete.
#[derive(Clone)]
pub struct FailureLedger {
    db: Db,
    tree: Tree,
}

impl FailureLedger {
    pub fn new(db: &Db) -> sled::Result<Self> {
        Ok(Self {
            db: db.clone(),
            tree: db.open_tree(FAILURE_LEDGER_TREE)?,
        })
    }

    pub fn record(&self, unit: FailedUnit, reason: impl Into<String>) -> TreasuryResult<u64> {
        let id = self.db.generate_id()?;
        let entry = FailureEntry::new(unit, reason.into());
        self.tree.insert(id.to_be_bytes(), serde_json::to_vec(&entry)?)?;
        Ok(id)
    }

    /// Re-failure of an existing entry: bumps the counter and replaces the unit
    /// (an ingest window may have advanced its offset).
    pub fn refail(&self, id: u64, unit: FailedUnit, reason: impl Into<String>) -> TreasuryResult<()> {
        let mut entry = match self.get(id)? {
            Some(entry) => entry,
            None => FailureEntry::new(unit.clone(), String::new()),
        };
        entry.unit = unit;
        entry.reason = reason.into();
        entry.occurrences += 1;
        entry.last_seen = Utc::now();
        self.tree.insert(id.to_be_bytes(), serde_json::to_vec(&entry)?)?;
        Ok(())
    }

    pub fn resolve(&self, id: u64) -> TreasuryResult<bool> {
        Ok(self.tree.remove(id.to_be_bytes())?.is_some())
    }

    pub fn get(&self, id: u64) -> TreasuryResult<Option<FailureEntry>> {
        match self.tree.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn entries(&self) -> TreasuryResult<Vec<(u64, FailureEntry)>> {
        let mut out = Vec::new();

        for item in self.tree.iter() {
            let (key, value) = item?;
            let mut id = [0u8; 8];
            id.copy_from_slice(&key[..8]);
            out.push((u64::from_be_bytes(id), serde_json::from_slice(&value)?));
        }

        Ok(out)
    }

    pub fn ingest_windows(&self) -> TreasuryResult<Vec<(u64, FailureEntry)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, entry)| matches!(entry.unit, FailedUnit::IngestWindow { .. }))
            .collect())
    }

    pub fn classify_batches(&self) -> TreasuryResult<Vec<(u64, FailureEntry)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, entry)| matches!(entry.unit, FailedUnit::ClassifyBatch { .. }))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
