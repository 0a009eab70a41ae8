use crate::config::decimals_for;
use crate::error::{TreasuryError, TreasuryResult};
use crate::helpers::amounts::scale_amount;
use crate::transfers::storage::TransferStorage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub updated: usize,
    pub skipped: usize,
}

/// Writes `std_value = value / 10^decimals` onto every stored transfer. Safe to re-run;
/// the scaled field is overwritten each time. Records without a usable raw amount are
/// skipped and counted.
pub fn normalize_amounts(transfers: &TransferStorage) -> TreasuryResult<NormalizeReport> {
    let mut report = NormalizeReport::default();

    for (id, mut record) in transfers.all()? {
        let scaled = record
            .value
            .as_deref()
            .and_then(|raw| scale_amount(raw, decimals_for(&record.token_symbol)));

        match scaled {
            Some(std_value) => {
                record.std_value = Some(std_value);
                transfers.put(id, &record)?;
                report.updated += 1;
            }
            None => {
                let err = TreasuryError::MissingField { id, field: "value" };
                log::warn!("Skipping {}: {}", record.transaction_hash, err);
                report.skipped += 1;
            }
        }
    }

    log::info!(
        "Normalization done: {} records updated, {} skipped",
        report.updated,
        report.skipped
    );

    Ok(report)
}
