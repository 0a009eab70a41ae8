// Command line surface: one stage per invocation.

use anyhow::{anyhow, bail, Result};
use getopts::{Matches, Options};

use treasury_core::ingest::dto::{TRACK_2024, TRACK_WETH};
use treasury_core::maintenance::handler::DEFAULT_PURGE;
use treasury_core::transfers::dto::FeeCategory;

#[derive(Debug, Clone, PartialEq)]
pub enum ScanTarget {
    Track2024,
    TrackWeth,
    Range {
        address: Option<String>,
        start: u64,
        end: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Scan(ScanTarget),
    ReplayWindows,
    StdValues,
    FeeType { only_unclassified: bool },
    ReplayBatches,
    Purge { category: FeeCategory, symbol: String },
    Archive,
    FrontendData { weth_history: bool, max_amount: Option<f64> },
    Currency,
    Balance,
    Export,
    Ledger,
}

const STAGE_FLAGS: &[&str] = &[
    "scan",
    "replay-windows",
    "std-values",
    "fee-type",
    "replay-batches",
    "purge",
    "archive",
    "frontend-data",
    "currency",
    "balance",
    "export",
    "ledger",
];

pub fn build_options() -> Options {
    let mut opts = Options::new();
    opts.optflag("s", "scan", "Ingest transfers for a block range");
    opts.optflag("", "replay-windows", "Retry ingestion windows recorded as failed");
    opts.optflag("n", "std-values", "Write scaled amounts onto stored transfers");
    opts.optflag("f", "fee-type", "Classify stored transactions by fee purpose");
    opts.optflag("", "replay-batches", "Retry classification batches recorded as failed");
    opts.optflag("p", "purge", "Delete stored transfers by category and token");
    opts.optflag("a", "archive", "Move stored transfers into the archive");
    opts.optflag("g", "frontend-data", "Rebuild the daily aggregate rows");
    opts.optflag("c", "currency", "Store a USD price snapshot");
    opts.optflag("b", "balance", "Store a wallet balance snapshot");
    opts.optflag("e", "export", "Write dashboard JSON files");
    opts.optflag("l", "ledger", "List recorded failures");
    opts.optflag("h", "help", "Show this help message");

    opts.optopt("", "track", "Predefined range for --scan or --frontend-data", "2024|weth");
    opts.optopt("", "address", "Address for --scan (defaults to TREASURY_WALLET)", "ADDR");
    opts.optopt("", "start", "First block for --scan", "BLOCK");
    opts.optopt("", "end", "Last block for --scan", "BLOCK");
    opts.optflag("", "only-unclassified", "With --fee-type, skip transactions already labelled");
    opts.optopt("", "purge-category", "Category for --purge (default partsEvol)", "CATEGORY");
    opts.optopt("", "purge-symbol", "Token symbol for --purge (default AM)", "SYMBOL");
    opts.optopt("", "max-amount", "With --frontend-data, ignore transfers at or above this amount", "AMOUNT");
    opts
}

pub fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} STAGE [OPTIONS]", program);
    print!("{}", opts.usage(&brief));
    println!("\nDefault ranges:");
    println!("  --track 2024      blocks {}..={}", TRACK_2024.0, TRACK_2024.1);
    println!("  --track weth      blocks {}..={}", TRACK_WETH.0, TRACK_WETH.1);
    println!("\nEnvironment variables:");
    println!("  SKYNET_API_KEY    Indexing gateway key (required for API stages)");
    println!("  TREASURY_DB_PATH  Database directory (default treasury_db)");
    println!("  TREASURY_WALLET   Tracked wallet");
    println!("  EXPORT_DIR        Dashboard data directory (default dashboard_data)");
}

/// Exactly one stage flag must be present.
pub fn stage_from_matches(matches: &Matches) -> Result<Stage> {
    let selected: Vec<&str> = STAGE_FLAGS
        .iter()
        .copied()
        .filter(|flag| matches.opt_present(flag))
        .collect();

    let flag = match selected.as_slice() {
        [flag] => *flag,
        [] => bail!("Must specify one stage, e.g. --scan or --fee-type"),
        many => bail!("Only one stage per run, got --{}", many.join(", --")),
    };

    let track = matches.opt_str("track");

    let stage = match flag {
        "scan" => Stage::Scan(scan_target(matches, track.as_deref())?),
        "replay-windows" => Stage::ReplayWindows,
        "std-values" => Stage::StdValues,
        "fee-type" => Stage::FeeType {
            only_unclassified: matches.opt_present("only-unclassified"),
        },
        "replay-batches" => Stage::ReplayBatches,
        "purge" => {
            let category = match matches.opt_str("purge-category") {
                Some(raw) => raw.parse::<FeeCategory>().map_err(|e| anyhow!(e))?,
                None => DEFAULT_PURGE.0,
            };
            let symbol = matches
                .opt_str("purge-symbol")
                .unwrap_or_else(|| DEFAULT_PURGE.1.to_string());
            Stage::Purge { category, symbol }
        }
        "archive" => Stage::Archive,
        "frontend-data" => {
            let weth_history = match track.as_deref() {
                None | Some("2024") => false,
                Some("weth") => true,
                Some(other) => bail!("Unknown track `{}`", other),
            };
            let max_amount = matches
                .opt_str("max-amount")
                .map(|raw| raw.parse::<f64>())
                .transpose()
                .map_err(|e| anyhow!("--max-amount: {}", e))?;
            Stage::FrontendData {
                weth_history,
                max_amount,
            }
        }
        "currency" => Stage::Currency,
        "balance" => Stage::Balance,
        "export" => Stage::Export,
        "ledger" => Stage::Ledger,
        other => bail!("Unhandled stage --{}", other),
    };

    Ok(stage)
}

fn scan_target(matches: &Matches, track: Option<&str>) -> Result<ScanTarget> {
    match track {
        Some("2024") => return Ok(ScanTarget::Track2024),
        Some("weth") => return Ok(ScanTarget::TrackWeth),
        Some(other) => bail!("Unknown track `{}`", other),
        None => {}
    }

    let block = |name: &str| -> Result<u64> {
        matches
            .opt_str(name)
            .ok_or_else(|| anyhow!("--scan needs --track or both --start and --end"))?
            .parse::<u64>()
            .map_err(|e| anyhow!("--{}: {}", name, e))
    };

    Ok(ScanTarget::Range {
        address: matches.opt_str("address"),
        start: block("start")?,
        end: block("end")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Stage> {
        let matches = build_options().parse(args).unwrap();
        stage_from_matches(&matches)
    }

    #[test]
    fn test_scan_variants() {
        assert_eq!(parse(&["--scan", "--track", "2024"]).unwrap(), Stage::Scan(ScanTarget::Track2024));
        assert_eq!(
            parse(&["--scan", "--start", "10", "--end", "20"]).unwrap(),
            Stage::Scan(ScanTarget::Range {
                address: None,
                start: 10,
                end: 20
            })
        );
        assert!(parse(&["--scan", "--start", "10"]).is_err());
        assert!(parse(&["--scan", "--track", "2023"]).is_err());
    }

    #[test]
    fn test_exactly_one_stage() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--scan", "--fee-type"]).is_err());
        assert_eq!(
            parse(&["-f", "--only-unclassified"]).unwrap(),
            Stage::FeeType {
                only_unclassified: true
            }
        );
    }

    #[test]
    fn test_purge_defaults_and_overrides() {
        assert_eq!(
            parse(&["--purge"]).unwrap(),
            Stage::Purge {
                category: FeeCategory::PartsEvol,
                symbol: "AM".to_string()
            }
        );
        assert_eq!(
            parse(&["--purge", "--purge-category", "breeding", "--purge-symbol", "SLP"]).unwrap(),
            Stage::Purge {
                category: FeeCategory::Breeding,
                symbol: "SLP".to_string()
            }
        );
        assert!(parse(&["--purge", "--purge-category", "refund"]).is_err());
    }

    #[test]
    fn test_frontend_data_options() {
        assert_eq!(
            parse(&["--frontend-data", "--track", "weth", "--max-amount", "25"]).unwrap(),
            Stage::FrontendData {
                weth_history: true,
                max_amount: Some(25.0)
            }
        );
        assert!(parse(&["--frontend-data", "--max-amount", "lots"]).is_err());
    }
}
