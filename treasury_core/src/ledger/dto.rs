use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of work that failed and can be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailedUnit {
    /// Pages from `offset` onwards were never stored for this window. `offset` is a
    /// multiple of `page_size`, the page size the window was scanned with.
    IngestWindow {
        address: String,
        from_block: u64,
        to_block: u64,
        offset: usize,
        page_size: usize,
    },
    ClassifyBatch { hashes: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub unit: FailedUnit,
    pub reason: String,
    pub occurrences: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl FailureEntry {
    pub fn new(unit: FailedUnit, reason: String) -> Self {
        let now = Utc::now();
        Self {
            unit,
            reason,
            occurrences: 1,
            first_seen: now,
            last_seen: now,
        }
    }
}
