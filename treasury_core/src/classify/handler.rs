use std::collections::{BTreeMap, HashMap};

use crate::classify::rules::RuleTable;
use crate::error::TreasuryResult;
use crate::ledger::dto::{FailedUnit, FailureEntry};
use crate::skynet::handler::Skynet;
use crate::store::TreasuryStore;
use crate::transfers::dto::{FeeCategory, TransferRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOptions {
    pub batch_size: usize,
    pub only_unclassified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub hashes: usize,
    pub classified: usize,
    /// Hashes the lookup returned no legs for. They stay unclassified.
    pub misses: usize,
    pub failed_batches: usize,
    pub records_updated: usize,
    /// Ledgered batches whose hashes this run labelled.
    pub settled_batches: usize,
    pub by_category: BTreeMap<FeeCategory, usize>,
}

/// Labels every distinct stored transaction with one fee category, judged from the
/// full leg set the lookup endpoint returns for it, and writes the label onto every
/// stored record of that transaction.
pub async fn classify_transfers(
    skynet: &Skynet,
    store: &TreasuryStore,
    rules: &RuleTable,
    options: &ClassifyOptions,
) -> TreasuryResult<ClassifyReport> {
    let hashes = store.transfers.distinct_hashes(options.only_unclassified)?;
    let ledgered = store.ledger.classify_batches()?;
    let batch_size = options.batch_size.max(1);
    log::info!(
        "Classifying {} transactions in batches of {}",
        hashes.len(),
        batch_size
    );

    let mut report = ClassifyReport {
        hashes: hashes.len(),
        ..ClassifyReport::default()
    };

    for batch in hashes.chunks(batch_size) {
        match classify_batch(skynet, store, rules, batch, &mut report).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                log::error!("Batch of {} hashes failed: {}", batch.len(), err);
                store.ledger.record(
                    FailedUnit::ClassifyBatch {
                        hashes: batch.to_vec(),
                    },
                    err.to_string(),
                )?;
                report.failed_batches += 1;
            }
        }
    }

    report.settled_batches = settle_ledgered_batches(store, ledgered)?;
    store.flush()?;
    log_report("Classification", &report);

    Ok(report)
}

/// Re-submits every batch the ledger holds. Resolved batches leave the ledger.
pub async fn replay_failed_batches(
    skynet: &Skynet,
    store: &TreasuryStore,
    rules: &RuleTable,
) -> TreasuryResult<ClassifyReport> {
    let mut report = ClassifyReport::default();

    for (id, entry) in store.ledger.classify_batches()? {
        let FailedUnit::ClassifyBatch { hashes } = entry.unit else {
            continue;
        };
        report.hashes += hashes.len();

        match classify_batch(skynet, store, rules, &hashes, &mut report).await {
            Ok(()) => {
                store.ledger.resolve(id)?;
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                log::error!("Replayed batch {} failed again: {}", id, err);
                store.ledger.refail(
                    id,
                    FailedUnit::ClassifyBatch { hashes },
                    err.to_string(),
                )?;
                report.failed_batches += 1;
            }
        }
    }

    store.flush()?;
    log_report("Batch replay", &report);

    Ok(report)
}

/// Resolves ledger entries, taken before the run, whose hashes now all carry a label.
fn settle_ledgered_batches(
    store: &TreasuryStore,
    ledgered: Vec<(u64, FailureEntry)>,
) -> TreasuryResult<usize> {
    let mut settled = 0;

    for (id, entry) in ledgered {
        let FailedUnit::ClassifyBatch { hashes } = entry.unit else {
            continue;
        };
        let mut labelled = true;
        for hash in &hashes {
            if store
                .transfers
                .by_hash(hash)?
                .iter()
                .any(|(_, record)| record.fee_type.is_none())
            {
                labelled = false;
                break;
            }
        }
        if labelled && store.ledger.resolve(id)? {
            log::info!("Ledgered batch {} of {} hashes is now classified", id, hashes.len());
            settled += 1;
        }
    }

    Ok(settled)
}

async fn classify_batch(
    skynet: &Skynet,
    store: &TreasuryStore,
    rules: &RuleTable,
    hashes: &[String],
    report: &mut ClassifyReport,
) -> TreasuryResult<()> {
    let legs = skynet.transfers_by_txs(hashes).await?;
    let grouped = group_by_hash(legs);

    for hash in hashes {
        let category = grouped
            .get(&hash.to_lowercase())
            .and_then(|legs| rules.classify(legs));

        let Some(category) = category else {
            log::warn!("No legs returned for {}, leaving it unclassified", hash);
            report.misses += 1;
            continue;
        };

        report.records_updated += store.transfers.set_fee_type_for_hash(hash, category)?;
        report.classified += 1;
        *report.by_category.entry(category).or_insert(0) += 1;
    }

    Ok(())
}

fn group_by_hash(legs: Vec<TransferRecord>) -> HashMap<String, Vec<TransferRecord>> {
    let mut grouped: HashMap<String, Vec<TransferRecord>> = HashMap::new();
    for leg in legs {
        grouped
            .entry(leg.transaction_hash.to_lowercase())
            .or_default()
            .push(leg);
    }
    grouped
}

fn log_report(stage: &str, report: &ClassifyReport) {
    let categories = report
        .by_category
        .iter()
        .map(|(category, count)| format!("{}={}", category, count))
        .collect::<Vec<_>>()
        .join(", ");

    log::info!(
        "{} done: {} hashes, {} classified, {} misses, {} failed batches, {} settled batches, {} records updated [{}]",
        stage,
        report.hashes,
        report.classified,
        report.misses,
        report.failed_batches,
        report.settled_batches,
        report.records_updated,
        categories
    );
}
