use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::aggregate::dto::{field_name, AggregateOptions, AggregateReport, DailyAggregate};
use crate::aggregate::storage::FrontendStorage;
use crate::error::TreasuryResult;
use crate::helpers::dates::day_of;
use crate::transfers::dto::TransferRecord;
use crate::transfers::storage::TransferStorage;

/// Per-day sums for every (token, category) pair in `options`, merged into one row per day.
/// Only classified, normalized transfers to the wallet count.
pub fn daily_sums(
    records: &[TransferRecord],
    options: &AggregateOptions,
) -> (BTreeMap<NaiveDate, DailyAggregate>, AggregateReport) {
    let mut rows: BTreeMap<NaiveDate, DailyAggregate> = BTreeMap::new();
    let mut report = AggregateReport::default();

    for record in records {
        let Some(category) = record.fee_type else {
            continue;
        };
        let Some(token) = options.tokens.iter().find(|token| **token == record.token_symbol) else {
            continue;
        };
        if !options.categories.contains(&category) || !record.is_to(&options.wallet) {
            continue;
        }

        let Some(std_value) = record.std_value else {
            report.unnormalized += 1;
            continue;
        };
        if options
            .max_scaled_amount
            .is_some_and(|max| std_value >= max)
        {
            continue;
        }
        let Some(day) = day_of(record.block_time) else {
            continue;
        };

        let row = rows.entry(day).or_insert_with(|| DailyAggregate::new(day));
        *row.fields.entry(field_name(token, category)).or_insert(0.0) += std_value;
        report.records_used += 1;
    }

    report.days = rows.len();
    (rows, report)
}

/// Recomputes the daily series from the stored transfers and rewrites the fields
/// `options` owns on every day that has an inflow of one of its tokens. A field whose
/// records were relabelled away is dropped, so running it twice leaves the same rows.
pub fn aggregate_daily(
    transfers: &TransferStorage,
    frontend: &FrontendStorage,
    options: &AggregateOptions,
) -> TreasuryResult<AggregateReport> {
    let records: Vec<TransferRecord> = transfers
        .all()?
        .into_iter()
        .map(|(_, record)| record)
        .collect();

    let (rows, report) = daily_sums(&records, options);
    let owned = options.owned_fields();

    for day in inflow_days(&records, options) {
        match rows.get(&day) {
            Some(row) => frontend.replace(row, &owned)?,
            None => frontend.replace(&DailyAggregate::new(day), &owned)?,
        }
    }

    if report.unnormalized > 0 {
        log::warn!(
            "{} matching records have no scaled amount; run the normalization stage first",
            report.unnormalized
        );
    }
    log::info!(
        "Aggregation done: {} days written from {} records",
        report.days,
        report.records_used
    );

    Ok(report)
}

/// Days with a transfer of one of the run's tokens to the wallet, whatever its label.
fn inflow_days(records: &[TransferRecord], options: &AggregateOptions) -> BTreeSet<NaiveDate> {
    records
        .iter()
        .filter(|record| options.tokens.iter().any(|token| *token == record.token_symbol))
        .filter(|record| record.is_to(&options.wallet))
        .filter_map(|record| day_of(record.block_time))
        .collect()
}
