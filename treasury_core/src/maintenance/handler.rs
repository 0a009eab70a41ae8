use crate::error::TreasuryResult;
use crate::transfers::dto::FeeCategory;
use crate::transfers::storage::TransferStorage;

/// Axie Materials legs land in parts-evolution transactions and throw off classification.
pub const DEFAULT_PURGE: (FeeCategory, &str) = (FeeCategory::PartsEvol, "AM");

/// Deletes every stored transfer with the given category and token symbol.
pub fn purge(transfers: &TransferStorage, category: FeeCategory, token_symbol: &str) -> TreasuryResult<usize> {
    let mut deleted = 0;

    for (id, record) in transfers.all()? {
        if record.fee_type != Some(category) || record.token_symbol != token_symbol {
            continue;
        }
        if transfers.remove(id)?.is_some() {
            deleted += 1;
        }
    }

    log::info!(
        "Purged {} `{}` records with category {}",
        deleted,
        token_symbol,
        category
    );

    Ok(deleted)
}

/// Moves the working transfer set into the archive and empties it, ready for the
/// next tracking period.
pub fn archive(transfers: &TransferStorage) -> TreasuryResult<usize> {
    let moved = transfers.archive_all()?;
    log::info!(
        "Archived {} records ({} in archive)",
        moved,
        transfers.archived_len()
    );
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfers::storage::tests::{create_test_db, leg};

    #[test]
    fn test_purge_matches_category_and_symbol() {
        let (db, _temp) = create_test_db();
        let transfers = TransferStorage::new(&db).unwrap();
        transfers
            .insert_many(&[
                leg("0xaa", "AM", "0x1", "0x2", "1"),
                leg("0xaa", "AXS", "0x1", "0x2", "1"),
                leg("0xbb", "AM", "0x1", "0x2", "1"),
            ])
            .unwrap();
        transfers.set_fee_type_for_hash("0xaa", FeeCategory::PartsEvol).unwrap();
        transfers.set_fee_type_for_hash("0xbb", FeeCategory::Marketplace).unwrap();

        let (category, symbol) = DEFAULT_PURGE;
        assert_eq!(purge(&transfers, category, symbol).unwrap(), 1);
        assert_eq!(transfers.len(), 2);
        assert_eq!(purge(&transfers, category, symbol).unwrap(), 0);
    }

    #[test]
    fn test_archive_empties_working_set() {
        let (db, _temp) = create_test_db();
        let transfers = TransferStorage::new(&db).unwrap();
        transfers
            .insert_many(&[leg("0xaa", "AXS", "0x1", "0x2", "1")])
            .unwrap();

        assert_eq!(archive(&transfers).unwrap(), 1);
        assert!(transfers.is_empty());
        assert_eq!(transfers.archived_len(), 1);
    }
}
