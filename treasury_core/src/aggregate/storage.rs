use std::collections::BTreeSet;

use chrono::NaiveDate;
use sled::{Db, Tree};

use crate::aggregate::dto::DailyAggregate;
use crate::error::TreasuryResult;
use crate::helpers::dates::DAY_KEY_FORMAT;

const FRONTEND_DATA_TREE: &str = "frontend_data";

/// Daily aggregate rows keyed by `YYYY-MM-DD`, so iteration order is day order.
#[derive(Clone)]
pub struct FrontendStorage {
    tree: Tree,
}

impl FrontendStorage {
    pub fn new(db: &Db) -> sled::Result<Self> {
        Ok(Self {
            tree: db.open_tree(FRONTEND_DATA_TREE)?,
        })
    }

    pub fn get(&self, day: NaiveDate) -> TreasuryResult<Option<DailyAggregate>> {
        match self.tree.get(day_key(day))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Rewrites the fields a run owns on the day's row: every name in `owned` is
    /// dropped and then `row.fields` are set. Fields outside `owned` are left as they
    /// were, so series written by different runs coexist.
    pub fn replace(&self, row: &DailyAggregate, owned: &BTreeSet<String>) -> TreasuryResult<()> {
        let mut stored = match self.get(row.day)? {
            Some(stored) => stored,
            None if row.fields.is_empty() => return Ok(()),
            None => DailyAggregate::new(row.day),
        };

        stored.date = row.date;
        stored.fields.retain(|field, _| !owned.contains(field));
        for (field, value) in &row.fields {
            stored.fields.insert(field.clone(), *value);
        }

        self.tree
            .insert(day_key(row.day), serde_json::to_vec(&stored)?)?;
        Ok(())
    }

    pub fn list(&self) -> TreasuryResult<Vec<DailyAggregate>> {
        let mut rows = Vec::with_capacity(self.tree.len());
        for entry in self.tree.iter() {
            let (_, value) = entry?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfers::storage::tests::create_test_db;

    fn row(day: NaiveDate, fields: &[(&str, f64)]) -> DailyAggregate {
        let mut row = DailyAggregate::new(day);
        for (field, value) in fields {
            row.fields.insert(field.to_string(), *value);
        }
        row
    }

    fn owned(fields: &[&str]) -> BTreeSet<String> {
        fields.iter().map(|field| field.to_string()).collect()
    }

    #[test]
    fn test_replace_overwrites_and_merges() {
        let (db, _temp) = create_test_db();
        let frontend = FrontendStorage::new(&db).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let axs = owned(&["axs_breeding"]);

        frontend.replace(&row(day, &[("axs_breeding", 1.0)]), &axs).unwrap();
        frontend.replace(&row(day, &[("axs_breeding", 2.0)]), &axs).unwrap();
        frontend
            .replace(&row(day, &[("weth_marketplace", 0.5)]), &owned(&["weth_marketplace"]))
            .unwrap();

        let stored = frontend.get(day).unwrap().unwrap();
        assert_eq!(frontend.len(), 1);
        assert_eq!(stored.value("axs_breeding"), 2.0);
        assert_eq!(stored.value("weth_marketplace"), 0.5);
    }

    #[test]
    fn test_replace_drops_owned_fields_missing_from_row() {
        let (db, _temp) = create_test_db();
        let frontend = FrontendStorage::new(&db).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let axs = owned(&["axs_marketplace", "axs_partsEvol"]);

        frontend
            .replace(&row(day, &[("axs_partsEvol", 1.0), ("weth_marketplace", 0.5)]), &axs)
            .unwrap();
        frontend.replace(&row(day, &[("axs_marketplace", 1.0)]), &axs).unwrap();

        let stored = frontend.get(day).unwrap().unwrap();
        assert!(!stored.fields.contains_key("axs_partsEvol"));
        assert_eq!(stored.value("axs_marketplace"), 1.0);
        assert_eq!(stored.value("weth_marketplace"), 0.5);
    }

    #[test]
    fn test_empty_row_creates_nothing() {
        let (db, _temp) = create_test_db();
        let frontend = FrontendStorage::new(&db).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        frontend.replace(&row(day, &[]), &owned(&["axs_breeding"])).unwrap();

        assert!(frontend.is_empty());
    }

    #[test]
    fn test_list_is_day_ordered() {
        let (db, _temp) = create_test_db();
        let frontend = FrontendStorage::new(&db).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        let axs = owned(&["axs_breeding"]);

        frontend.replace(&row(later, &[("axs_breeding", 1.0)]), &axs).unwrap();
        frontend.replace(&row(earlier, &[("axs_breeding", 1.0)]), &axs).unwrap();

        let days: Vec<_> = frontend.list().unwrap().into_iter().map(|r| r.day).collect();
        assert_eq!(days, vec![earlier, later]);
    }
}
