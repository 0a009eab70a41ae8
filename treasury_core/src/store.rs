use std::path::Path;

use sled::Db;

use crate::aggregate::storage::FrontendStorage;
use crate::error::TreasuryResult;
use crate::ingest::storage::RangeStorage;
use crate::ledger::storage::FailureLedger;
use crate::snapshots::storage::SnapshotStorage;
use crate::transfers::storage::TransferStorage;

/// Every collection the pipeline reads or writes, opened on one sled database.
#[derive(Clone)]
pub struct TreasuryStore {
    db: Db,
    pub transfers: TransferStorage,
    pub frontend: FrontendStorage,
    pub snapshots: SnapshotStorage,
    pub ranges: RangeStorage,
    pub ledger: FailureLedger,
}

impl TreasuryStore {
    pub fn open(path: impl AsRef<Path>) -> TreasuryResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: Db) -> TreasuryResult<Self> {
        Ok(Self {
            transfers: TransferStorage::new(&db)?,
            frontend: FrontendStorage::new(&db)?,
            snapshots: SnapshotStorage::new(&db)?,
            ranges: RangeStorage::new(&db)?,
            ledger: FailureLedger::new(&db)?,
            db,
        })
    }

    pub fn flush(&self) -> TreasuryResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transfers::storage::tests::create_test_db;
    use tempfile::TempDir;

    pub(crate) fn create_test_store() -> (TreasuryStore, TempDir) {
        let (db, temp) = create_test_db();
        (TreasuryStore::from_db(db).unwrap(), temp)
    }

    #[test]
    fn test_reopen_keeps_collections() {
        let temp = TempDir::new().unwrap();
        {
            let store = TreasuryStore::open(temp.path()).unwrap();
            store
                .transfers
                .insert_many(&[crate::transfers::storage::tests::leg(
                    "0xaa", "AXS", "0x1", "0x2", "1",
                )])
                .unwrap();
            store.flush().unwrap();
        }

        let store = TreasuryStore::open(temp.path()).unwrap();
        assert_eq!(store.transfers.len(), 1);
        assert!(store.ledger.is_empty());
    }
}
