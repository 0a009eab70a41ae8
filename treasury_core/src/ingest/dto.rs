use serde::{Deserialize, Serialize};

use crate::error::{TreasuryError, TreasuryResult};

/// First block of 2024 through early August 2024.
pub const TRACK_2024: (u64, u64) = (37_212_719, 37_226_611);
/// Historical range used to rebuild the WETH marketplace series.
pub const TRACK_WETH: (u64, u64) = (17_934_197, 30_746_337);

/// One ingestion request: an address, an inclusive block range and how to cut it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestPlan {
    pub address: String,
    pub start_block: u64,
    pub end_block: u64,
    pub window_size: u64,
    pub page_size: usize,
}

impl IngestPlan {
    pub fn new(
        address: impl Into<String>,
        start_block: u64,
        end_block: u64,
        window_size: u64,
        page_size: usize,
    ) -> Self {
        Self {
            address: address.into().trim().to_lowercase(),
            start_block,
            end_block,
            window_size,
            page_size,
        }
    }

    pub fn track_2024(address: &str, window_size: u64, page_size: usize) -> Self {
        Self::new(address, TRACK_2024.0, TRACK_2024.1, window_size, page_size)
    }

    pub fn track_weth(address: &str, window_size: u64, page_size: usize) -> Self {
        Self::new(address, TRACK_WETH.0, TRACK_WETH.1, window_size, page_size)
    }

    pub fn validate(&self) -> TreasuryResult<()> {
        if self.address.is_empty() {
            return Err(TreasuryError::InvalidPlan("address is empty".to_string()));
        }
        if self.start_block > self.end_block {
            return Err(TreasuryError::InvalidPlan(format!(
                "start block {} is after end block {}",
                self.start_block, self.end_block
            )));
        }
        if self.window_size == 0 || self.page_size == 0 {
            return Err(TreasuryError::InvalidPlan(
                "window and page sizes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Consecutive windows of at most `window_size` blocks covering the whole range.
    pub fn windows(&self) -> Vec<BlockWindow> {
        let mut windows = Vec::new();
        if self.window_size == 0 {
            return windows;
        }

        let mut from = self.start_block;
        loop {
            let to = from
                .saturating_add(self.window_size - 1)
                .min(self.end_block);
            windows.push(BlockWindow { from, to });
            if to >= self.end_block {
                break;
            }
            from = to + 1;
        }

        windows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockWindow {
    pub from: u64,
    pub to: u64,
}

/// Range already pulled into the store for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedRange {
    pub address: String,
    pub start_block: u64,
    pub end_block: u64,
}

impl IngestedRange {
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start_block <= end && start <= self.end_block
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub windows: usize,
    pub requests: usize,
    pub inserted: usize,
    pub failed_windows: usize,
}

impl IngestReport {
    pub fn absorb(&mut self, window: WindowOutcome) {
        self.windows += 1;
        self.requests += window.requests;
        self.inserted += window.inserted;
        if window.failure.is_some() {
            self.failed_windows += 1;
        }
    }
}

/// What paging one window produced. `failure` holds the offset that could not be
/// fetched and why.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowOutcome {
    pub requests: usize,
    pub inserted: usize,
    pub failure: Option<(usize, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub attempted: usize,
    pub resolved: usize,
    pub still_failing: usize,
    pub inserted: usize,
}
