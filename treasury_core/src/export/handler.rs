use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::TreasuryResult;
use crate::export::dto::{
    ExportReport, ExportedDailyRow, BALANCE_FILE, CURRENCY_FILE, FRONTEND_DATA_FILE,
};
use crate::snapshots::dto::{BalanceSnapshot, CurrencySnapshot};
use crate::store::TreasuryStore;

/// Dumps the daily series and both snapshot collections into `dir` as JSON arrays.
pub fn export_all(store: &TreasuryStore, dir: &Path) -> TreasuryResult<ExportReport> {
    fs::create_dir_all(dir)?;

    let rows: Vec<ExportedDailyRow> = store
        .frontend
        .list()?
        .iter()
        .map(ExportedDailyRow::from)
        .collect();
    let currency = store.snapshots.currency()?;
    let balances = store.snapshots.balances()?;

    write_json(&dir.join(FRONTEND_DATA_FILE), &rows)?;
    write_json(&dir.join(CURRENCY_FILE), &currency)?;
    write_json(&dir.join(BALANCE_FILE), &balances)?;

    let report = ExportReport {
        frontend_rows: rows.len(),
        currency_snapshots: currency.len(),
        balance_snapshots: balances.len(),
    };
    log::info!(
        "Exported {} daily rows, {} currency and {} balance snapshots to {}",
        report.frontend_rows,
        report.currency_snapshots,
        report.balance_snapshots,
        dir.display()
    );

    Ok(report)
}

pub fn parse_frontend_rows(bytes: &[u8]) -> TreasuryResult<Vec<ExportedDailyRow>> {
    let mut rows: Vec<ExportedDailyRow> = serde_json::from_slice(bytes)?;
    rows.sort_by_key(|row| row.timestamp);
    Ok(rows)
}

pub fn parse_currency(bytes: &[u8]) -> TreasuryResult<Vec<CurrencySnapshot>> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn parse_balance(bytes: &[u8]) -> TreasuryResult<Vec<BalanceSnapshot>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Written next to the target and renamed over it, so a reader never sees half a file.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> TreasuryResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::dto::DailyAggregate;
    use crate::snapshots::dto::BalanceEntry;
    use crate::store::tests::create_test_store;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::collections::{BTreeMap, BTreeSet};
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_wrapped_dates() {
        let (store, _temp) = create_test_store();
        let out = TempDir::new().unwrap();

        let mut row = DailyAggregate::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        row.fields.insert("axs_breeding".to_string(), 2.0);
        let owned: BTreeSet<String> = row.fields.keys().cloned().collect();
        store.frontend.replace(&row, &owned).unwrap();
        store
            .snapshots
            .append_currency(&CurrencySnapshot {
                timestamp: Utc.with_ymd_and_hms(2024, 8, 9, 10, 0, 0).unwrap(),
                prices: BTreeMap::from([("AXS".to_string(), 5.0), ("WETH".to_string(), 2500.0)]),
            })
            .unwrap();
        store
            .snapshots
            .append_balance(&BalanceSnapshot {
                timestamp: Utc.with_ymd_and_hms(2024, 8, 9, 10, 5, 0).unwrap(),
                owner: "0xabc".to_string(),
                items: vec![BalanceEntry {
                    token_symbol: "AXS".to_string(),
                    contract_address: None,
                    balance: Some("1000000000000000000".to_string()),
                    decimals: Some(18),
                    std_value: Some(1.0),
                }],
            })
            .unwrap();

        let report = export_all(&store, out.path()).unwrap();
        assert_eq!(
            report,
            ExportReport {
                frontend_rows: 1,
                currency_snapshots: 1,
                balance_snapshots: 1
            }
        );

        let raw: Value =
            serde_json::from_slice(&fs::read(out.path().join(FRONTEND_DATA_FILE)).unwrap()).unwrap();
        assert_eq!(
            raw,
            json!([{
                "timestamp": {"$date": "2024-01-02T00:00:00.000Z"},
                "date": 1704153600,
                "axs_breeding": 2.0
            }])
        );

        let rows = parse_frontend_rows(&fs::read(out.path().join(FRONTEND_DATA_FILE)).unwrap()).unwrap();
        assert_eq!(rows[0].day(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let currency = parse_currency(&fs::read(out.path().join(CURRENCY_FILE)).unwrap()).unwrap();
        assert_eq!(currency[0].price("WETH"), Some(2500.0));

        let balance = parse_balance(&fs::read(out.path().join(BALANCE_FILE)).unwrap()).unwrap();
        assert_eq!(balance[0].scaled_balance("AXS"), 1.0);
    }

    #[test]
    fn test_reader_accepts_plain_dates_and_sorts() {
        let rows = parse_frontend_rows(
            br#"[
                {"timestamp": "2024-01-03T00:00:00Z", "weth_marketplace": 1},
                {"timestamp": {"$date": "2024-01-01T00:00:00.000Z"}, "date": 1704067200}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, 1704067200);
        assert_eq!(rows[1].value("weth_marketplace"), 1.0);
        assert_eq!(rows[0].value("weth_marketplace"), 0.0);
    }
}
