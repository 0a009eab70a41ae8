use anyhow::Result;

use treasury_core::aggregate::dto::AggregateOptions;
use treasury_core::aggregate::handler::aggregate_daily;
use treasury_core::classify::handler::{
    classify_transfers, replay_failed_batches, ClassifyOptions, ClassifyReport,
};
use treasury_core::classify::rules::RuleTable;
use treasury_core::coingecko::handler::CoinGecko;
use treasury_core::config::Config;
use treasury_core::export::handler::export_all;
use treasury_core::ingest::dto::IngestPlan;
use treasury_core::ingest::handler::{ingest_range, replay_failed_windows};
use treasury_core::ledger::dto::FailedUnit;
use treasury_core::maintenance::handler::{archive, purge};
use treasury_core::normalize::handler::normalize_amounts;
use treasury_core::skynet::handler::Skynet;
use treasury_core::snapshots::handler::{capture_balance, capture_currency};
use treasury_core::store::TreasuryStore;

use crate::common::{ScanTarget, Stage};

pub async fn run(stage: Stage, config: &Config) -> Result<()> {
    let store = TreasuryStore::open(&config.db_path)?;

    match stage {
        Stage::Scan(target) => scan(config, &store, target).await?,
        Stage::ReplayWindows => {
            let skynet = Skynet::from_config(config)?;
            let report = replay_failed_windows(&skynet, &store).await?;
            println!(
                "🔁 Replayed {} windows: {} resolved, {} still failing, {} records inserted",
                report.attempted, report.resolved, report.still_failing, report.inserted
            );
        }
        Stage::StdValues => {
            let report = normalize_amounts(&store.transfers)?;
            println!(
                "✅ Scaled amounts written: {} updated, {} skipped",
                report.updated, report.skipped
            );
        }
        Stage::FeeType { only_unclassified } => {
            let skynet = Skynet::from_config(config)?;
            let rules = RuleTable::treasury_defaults(&config.wallet);
            let options = ClassifyOptions {
                batch_size: config.lookup_batch_size,
                only_unclassified,
            };
            let report = classify_transfers(&skynet, &store, &rules, &options).await?;
            print_classify_report(&report);
        }
        Stage::ReplayBatches => {
            let skynet = Skynet::from_config(config)?;
            let rules = RuleTable::treasury_defaults(&config.wallet);
            let report = replay_failed_batches(&skynet, &store, &rules).await?;
            print_classify_report(&report);
        }
        Stage::Purge { category, symbol } => {
            let deleted = purge(&store.transfers, category, &symbol)?;
            println!("🗑️  Documents deleted: {}", deleted);
        }
        Stage::Archive => {
            let moved = archive(&store.transfers)?;
            println!("📦 {} documents moved to the archive", moved);
        }
        Stage::FrontendData {
            weth_history,
            max_amount,
        } => {
            let mut options = if weth_history {
                AggregateOptions::weth_history(&config.wallet)
            } else {
                AggregateOptions::treasury_defaults(&config.wallet)
            };
            if max_amount.is_some() {
                options.max_scaled_amount = max_amount;
            }
            let report = aggregate_daily(&store.transfers, &store.frontend, &options)?;
            println!(
                "📊 {} daily rows written from {} records ({} not yet normalized)",
                report.days, report.records_used, report.unnormalized
            );
        }
        Stage::Currency => {
            let coingecko = CoinGecko::from_config(config)?;
            let snapshot = capture_currency(&coingecko, &store.snapshots).await?;
            println!("💱 Prices stored: {:?}", snapshot.prices);
        }
        Stage::Balance => {
            let skynet = Skynet::from_config(config)?;
            let snapshot = capture_balance(&skynet, &store.snapshots, &config.wallet).await?;
            println!("💰 Balance stored with {} tokens", snapshot.items.len());
        }
        Stage::Export => {
            let report = export_all(&store, &config.export_dir)?;
            println!(
                "📤 Exported {} daily rows, {} currency and {} balance snapshots to {}",
                report.frontend_rows,
                report.currency_snapshots,
                report.balance_snapshots,
                config.export_dir.display()
            );
        }
        Stage::Ledger => print_ledger(&store)?,
    }

    store.flush()?;
    Ok(())
}

async fn scan(config: &Config, store: &TreasuryStore, target: ScanTarget) -> Result<()> {
    let plan = match target {
        ScanTarget::Track2024 => {
            IngestPlan::track_2024(&config.wallet, config.window_size, config.page_size)
        }
        ScanTarget::TrackWeth => {
            IngestPlan::track_weth(&config.wallet, config.window_size, config.page_size)
        }
        ScanTarget::Range {
            address,
            start,
            end,
        } => IngestPlan::new(
            address.unwrap_or_else(|| config.wallet.clone()),
            start,
            end,
            config.window_size,
            config.page_size,
        ),
    };

    let skynet = Skynet::from_config(config)?;
    let report = ingest_range(&skynet, store, &plan).await?;

    println!(
        "✅ {} windows scanned with {} requests, {} documents stored",
        report.windows, report.requests, report.inserted
    );
    if report.failed_windows > 0 {
        println!(
            "⚠️  {} windows failed; run --replay-windows once the API recovers",
            report.failed_windows
        );
    }
    Ok(())
}

fn print_classify_report(report: &ClassifyReport) {
    println!(
        "✅ {} of {} transactions classified, {} records updated",
        report.classified, report.hashes, report.records_updated
    );
    for (category, count) in &report.by_category {
        println!("   {:<12} {}", category.display_name(), count);
    }
    if report.misses > 0 {
        println!("ℹ️  {} transactions had no legs and stay unclassified", report.misses);
    }
    if report.settled_batches > 0 {
        println!("🧹 {} earlier failed batches are now classified", report.settled_batches);
    }
    if report.failed_batches > 0 {
        println!(
            "⚠️  {} batches failed; run --replay-batches to retry them",
            report.failed_batches
        );
    }
}

fn print_ledger(store: &TreasuryStore) -> Result<()> {
    let entries = store.ledger.entries()?;
    if entries.is_empty() {
        println!("✅ No recorded failures");
        return Ok(());
    }

    for (id, entry) in entries {
        let unit = match &entry.unit {
            FailedUnit::IngestWindow {
                address,
                from_block,
                to_block,
                offset,
                page_size,
            } => format!(
                "window {}..={} of {} from offset {} (pages of {})",
                from_block, to_block, address, offset, page_size
            ),
            FailedUnit::ClassifyBatch { hashes } => format!("batch of {} hashes", hashes.len()),
        };
        println!(
            "#{} {} (x{}, last {}): {}",
            id,
            unit,
            entry.occurrences,
            entry.last_seen.format("%Y-%m-%d %H:%M"),
            entry.reason
        );
    }
    Ok(())
}
