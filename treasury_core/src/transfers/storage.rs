use std::collections::HashSet;

use sled::{Db, Tree};

use crate::error::TreasuryResult;
use crate::transfers::dto::{FeeCategory, TransferRecord};

const TRANSFERS_TREE: &str = "transfers";
const HASH_INDEX_TREE: &str = "transfers_by_hash";
const ARCHIVE_TREE: &str = "transfers_archive";

/// Transfer records keyed by the id sled hands out, plus a `hash -> ids` index
/// so one transaction's legs can be updated together.
#[derive(Clone)]
pub struct TransferStorage {
    db: Db,
    transfers: Tree,
    by_hash: Tree,
    archive: Tree,
}

impl TransferStorage {
    pub fn new(db: &Db) -> sled::Result<Self> {
        Ok(Self {
            db: db.clone(),
            transfers: db.open_tree(TRANSFERS_TREE)?,
            by_hash: db.open_tree(HASH_INDEX_TREE)?,
            archive: db.open_tree(ARCHIVE_TREE)?,
        })
    }

    /// Inserts every record as a new document. No deduplication happens here.
    pub fn insert_many(&self, records: &[TransferRecord]) -> TreasuryResult<Vec<u64>> {
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let id = self.db.generate_id()?;
            self.transfers.insert(id.to_be_bytes(), serde_json::to_vec(record)?)?;
            self.by_hash
                .insert(hash_index_key(&record.transaction_hash, id), Vec::<u8>::new())?;
            ids.push(id);
        }

        Ok(ids)
    }

    pub fn get(&self, id: u64) -> TreasuryResult<Option<TransferRecord>> {
        match self.transfers.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// All records in insertion order.
    pub fn all(&self) -> TreasuryResult<Vec<(u64, TransferRecord)>> {
        let mut out = Vec::with_capacity(self.transfers.len());

        for entry in self.transfers.iter() {
            let (key, value) = entry?;
            out.push((decode_id(&key), serde_json::from_slice(&value)?));
        }

        Ok(out)
    }

    pub fn ids_for_hash(&self, hash: &str) -> TreasuryResult<Vec<u64>> {
        let prefix = hash_index_prefix(hash);
        let mut ids = Vec::new();

        for entry in self.by_hash.scan_prefix(&prefix) {
            let (key, _) = entry?;
            ids.push(decode_id(&key[prefix.len()..]));
        }

        Ok(ids)
    }

    pub fn by_hash(&self, hash: &str) -> TreasuryResult<Vec<(u64, TransferRecord)>> {
        let mut out = Vec::new();

        for id in self.ids_for_hash(hash)? {
            if let Some(record) = self.get(id)? {
                out.push((id, record));
            }
        }

        Ok(out)
    }

    /// Distinct transaction hashes in first-seen order.
    pub fn distinct_hashes(&self, only_unclassified: bool) -> TreasuryResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut hashes = Vec::new();

        for (_, record) in self.all()? {
            if only_unclassified && record.fee_type.is_some() {
                continue;
            }
            if seen.insert(record.transaction_hash.clone()) {
                hashes.push(record.transaction_hash);
            }
        }

        Ok(hashes)
    }

    pub fn put(&self, id: u64, record: &TransferRecord) -> TreasuryResult<()> {
        self.transfers.insert(id.to_be_bytes(), serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Writes `category` onto every record sharing `hash`. Returns how many records changed.
    pub fn set_fee_type_for_hash(&self, hash: &str, category: FeeCategory) -> TreasuryResult<usize> {
        let mut modified = 0;

        for (id, mut record) in self.by_hash(hash)? {
            if record.fee_type != Some(category) {
                record.fee_type = Some(category);
                self.put(id, &record)?;
                modified += 1;
            }
        }

        Ok(modified)
    }

    pub fn remove(&self, id: u64) -> TreasuryResult<Option<TransferRecord>> {
        match self.transfers.remove(id.to_be_bytes())? {
            Some(bytes) => {
                let record: TransferRecord = serde_json::from_slice(&bytes)?;
                self.by_hash
                    .remove(hash_index_key(&record.transaction_hash, id))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Moves every record into the archive tree and empties the working set.
    pub fn archive_all(&self) -> TreasuryResult<usize> {
        let mut moved = 0;

        for entry in self.transfers.iter() {
            let (key, value) = entry?;
            self.archive.insert(key, value)?;
            moved += 1;
        }

        self.transfers.clear()?;
        self.by_hash.clear()?;
        self.db.flush()?;

        Ok(moved)
    }

    pub fn archived_len(&self) -> usize {
        self.archive.len()
    }
}

fn hash_index_prefix(hash: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(hash.len() + 1);
    prefix.extend_from_slice(hash.as_bytes());
    prefix.push(0);
    prefix
}

fn hash_index_key(hash: &str, id: u64) -> Vec<u8> {
    let mut key = hash_index_prefix(hash);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[8 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    u64::from_be_bytes(buf)
}
