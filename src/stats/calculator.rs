//! Statistics Calculator Module
//! Location filtering, derived ratios and the latest-date snapshot.

use crate::data::{Record, Table};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Most recent row of one location with its vaccination coverage.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRow {
    #[serde(flatten)]
    pub record: Record,
    pub death_rate: f64,
    pub vaccinated_pct: f64,
}

/// Day with the highest reported new cases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub date: NaiveDate,
    pub value: f64,
}

/// Handles derivations over the cleaned table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Keep rows whose location is in `countries`, preserving table order.
    pub fn filter_locations(table: Table, countries: &[String]) -> Table {
        let before = table.len();
        let filtered: Table = table
            .into_iter()
            .filter(|r| countries.iter().any(|c| c == &r.location))
            .collect();

        for country in countries {
            if !filtered.iter().any(|r| &r.location == country) {
                warn!(country = %country, "No rows for country");
            }
        }
        debug!(before, after = filtered.len(), "Filtered locations");
        filtered
    }

    /// Death rate of every row, in table order.
    pub fn death_rates(table: &[Record]) -> Vec<f64> {
        table.iter().map(Record::death_rate).collect()
    }

    /// Last row per location after a stable ascending sort by date.
    ///
    /// Rows sharing the maximum date resolve to the later one in table order.
    /// Output follows the sorted position of each chosen row.
    pub fn latest_snapshot(table: &[Record]) -> Vec<SnapshotRow> {
        let mut sorted: Vec<&Record> = table.iter().collect();
        sorted.sort_by_key(|r| r.date);

        let mut last_index: HashMap<&str, usize> = HashMap::new();
        for (i, record) in sorted.iter().enumerate() {
            last_index.insert(record.location.as_str(), i);
        }

        let mut chosen: Vec<usize> = last_index.into_values().collect();
        chosen.sort_unstable();

        chosen
            .into_iter()
            .map(|i| {
                let record = sorted[i].clone();
                SnapshotRow {
                    death_rate: record.death_rate(),
                    vaccinated_pct: record.vaccinated_pct(),
                    record,
                }
            })
            .collect()
    }

    /// Highest finite `new_cases` for a location. Earliest day wins ties.
    pub fn peak_new_cases(table: &[Record], location: &str) -> Option<Peak> {
        table
            .iter()
            .filter(|r| r.location == location)
            .filter_map(|r| r.new_cases.filter(|v| v.is_finite()).map(|v| (r.date, v)))
            .fold(None, |best: Option<Peak>, (date, value)| {
                let replace = best
                    .as_ref()
                    .map_or(true, |p| value > p.value || (value == p.value && date < p.date));
                if replace {
                    Some(Peak { date, value })
                } else {
                    best
                }
            })
    }

    /// Rows of one location, in table order.
    pub fn rows_for<'a>(
        table: &'a [Record],
        location: &'a str,
    ) -> impl Iterator<Item = &'a Record> {
        table.iter().filter(move |r| r.location == location)
    }
}
