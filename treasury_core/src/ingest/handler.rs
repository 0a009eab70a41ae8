use crate::error::TreasuryResult;
use crate::ingest::dto::{BlockWindow, IngestPlan, IngestReport, ReplayReport, WindowOutcome};
use crate::ledger::dto::FailedUnit;
use crate::skynet::handler::Skynet;
use crate::store::TreasuryStore;
use crate::transfers::storage::TransferStorage;

/// Pulls every transfer touching `plan.address` in `[start_block, end_block]` into the store.
///
/// The range must not overlap anything already ingested for the address, and it is
/// claimed before the first request so an interrupted run cannot be repeated over
/// pages it already stored. A window whose page fails (after retries) is recorded in
/// the failure ledger at the offset that failed and the run moves on to the next window.
pub async fn ingest_range(
    skynet: &Skynet,
    store: &TreasuryStore,
    plan: &IngestPlan,
) -> TreasuryResult<IngestReport> {
    plan.validate()?;
    store
        .ranges
        .check_disjoint(&plan.address, plan.start_block, plan.end_block)?;
    store
        .ranges
        .record(&plan.address, plan.start_block, plan.end_block)?;
    store.flush()?;

    let windows = plan.windows();
    log::info!(
        "Ingesting {} blocks {}..={} in {} windows",
        plan.address,
        plan.start_block,
        plan.end_block,
        windows.len()
    );

    let mut report = IngestReport::default();

    for window in windows {
        let outcome = paginate_window(
            skynet,
            &store.transfers,
            &plan.address,
            window,
            plan.page_size,
            0,
        )
        .await?;

        if let Some((offset, reason)) = &outcome.failure {
            store.ledger.record(
                FailedUnit::IngestWindow {
                    address: plan.address.clone(),
                    from_block: window.from,
                    to_block: window.to,
                    offset: *offset,
                    page_size: plan.page_size,
                },
                reason.clone(),
            )?;
        }

        report.absorb(outcome);
    }

    store.flush()?;

    log::info!(
        "Ingestion done: {} windows, {} requests, {} records inserted, {} windows failed",
        report.windows,
        report.requests,
        report.inserted,
        report.failed_windows
    );

    Ok(report)
}

/// Requests pages at `start_offset`, `start_offset + P`, ... until a page comes back
/// with fewer than `page_size` items. Only store errors are returned as `Err`;
/// an API failure ends the window and is reported through `WindowOutcome::failure`.
pub async fn paginate_window(
    skynet: &Skynet,
    transfers: &TransferStorage,
    address: &str,
    window: BlockWindow,
    page_size: usize,
    start_offset: usize,
) -> TreasuryResult<WindowOutcome> {
    let mut outcome = WindowOutcome::default();
    let mut offset = start_offset;

    loop {
        outcome.requests += 1;
        let items = match skynet
            .search_transfers(address, window.from, window.to, page_size, offset)
            .await
        {
            Ok(items) => items,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                log::error!(
                    "Window {}..={} failed at offset {}: {}",
                    window.from,
                    window.to,
                    offset,
                    err
                );
                outcome.failure = Some((offset, err.to_string()));
                break;
            }
        };

        let count = items.len();
        if count > 0 {
            transfers.insert_many(&items)?;
            outcome.inserted += count;
        }
        log::debug!(
            "Window {}..={} offset {}: {} items",
            window.from,
            window.to,
            offset,
            count
        );

        if count < page_size {
            break;
        }
        offset += page_size;
    }

    Ok(outcome)
}

/// Resumes every failed window in the ledger from the offset it stopped at, paging
/// with the page size the window was first scanned with.
pub async fn replay_failed_windows(
    skynet: &Skynet,
    store: &TreasuryStore,
) -> TreasuryResult<ReplayReport> {
    let mut report = ReplayReport::default();

    for (id, entry) in store.ledger.ingest_windows()? {
        let FailedUnit::IngestWindow {
            address,
            from_block,
            to_block,
            offset,
            page_size,
        } = entry.unit
        else {
            continue;
        };

        report.attempted += 1;
        let window = BlockWindow {
            from: from_block,
            to: to_block,
        };
        let outcome =
            paginate_window(skynet, &store.transfers, &address, window, page_size, offset).await?;
        report.inserted += outcome.inserted;

        match outcome.failure {
            None => {
                store.ledger.resolve(id)?;
                report.resolved += 1;
            }
            Some((failed_offset, reason)) => {
                store.ledger.refail(
                    id,
                    FailedUnit::IngestWindow {
                        address,
                        from_block,
                        to_block,
                        offset: failed_offset,
                        page_size,
                    },
                    reason,
                )?;
                report.still_failing += 1;
            }
        }
    }

    store.flush()?;
    log::info!(
        "Window replay done: {} attempted, {} resolved, {} still failing, {} records inserted",
        report.attempted,
        report.resolved,
        report.still_failing,
        report.inserted
    );

    Ok(report)
}
