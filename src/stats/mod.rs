//! Stats module - Derived ratios, snapshots and insights

mod calculator;
mod summary;

pub use calculator::{Peak, SnapshotRow, StatsCalculator};
pub use summary::{format_count, Insights};
