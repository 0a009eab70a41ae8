use sled::{Db, Tree};

use crate::error::{TreasuryError, TreasuryResult};
use crate::ingest::dto::IngestedRange;

const INGESTED_RANGES_TREE: &str = "ingested_ranges";

/// Block ranges already ingested per address. The transfer store does not
/// deduplicate, so overlapping ranges are refused up front.
#[derive(Clone)]
pub struct RangeStorage {
    tree: Tree,
}

impl RangeStorage {
    pub fn new(db: &Db) -> sled::Result<Self> {
        Ok(Self {
            tree: db.open_tree(INGESTED_RANGES_TREE)?,
        })
    }

    pub fn for_address(&self, address: &str) -> TreasuryResult<Vec<IngestedRange>> {
        let mut out = Vec::new();

        for entry in self.tree.scan_prefix(address_prefix(address)) {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(&value)?);
        }

        Ok(out)
    }

    pub fn check_disjoint(&self, address: &str, start: u64, end: u64) -> TreasuryResult<()> {
        if let Some(existing) = self
            .for_address(address)?
            .into_iter()
            .find(|range| range.overlaps(start, end))
        {
            return Err(TreasuryError::RangeOverlap {
                address: address.to_string(),
                start,
                end,
                existing_start: existing.start_block,
                existing_end: existing.end_block,
            });
        }
        Ok(())
    }

    pub fn record(&self, address: &str, start: u64, end: u64) -> TreasuryResult<()> {
        let range = IngestedRange {
            address: address.to_lowercase(),
            start_block: start,
            end_block: end,
        };
        let mut key = address_prefix(address);
        key.extend_from_slice(&start.to_be_bytes());
        self.tree.insert(key, serde_json::to_vec(&range)?)?;
        Ok(())
    }
}

fn address_prefix(address: &str) -> Vec<u8> {
    let mut prefix = address.to_lowercase().into_bytes();
    prefix.push(0);
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfers::storage::tests::create_test_db;

    #[test]
    fn test_overlap_is_per_address() {
        let (db, _temp) = create_test_db();
        let ranges = RangeStorage::new(&db).unwrap();

        ranges.record("0xAbc", 100, 200).unwrap();

        assert!(matches!(
            ranges.check_disjoint("0xabc", 150, 250),
            Err(TreasuryError::RangeOverlap { existing_start: 100, existing_end: 200, .. })
        ));
        assert!(ranges.check_disjoint("0xabc", 201, 300).is_ok());
        assert!(ranges.check_disjoint("0xdef", 100, 200).is_ok());
        assert_eq!(ranges.for_address("0xABC").unwrap().len(), 1);
    }
}
