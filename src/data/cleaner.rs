//! Data Cleaner Module
//! Projects the raw frame to the columns of interest, parses dates, drops
//! unidentifiable rows and forward-fills numeric gaps.

use crate::config::COLUMNS_OF_INTEREST;
use crate::data::{Record, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Unparsable date {value:?} at row {row}")]
    InvalidDate { row: usize, value: String },
    #[error("Column {column} holds non-numeric values: {source}")]
    InvalidNumber {
        column: String,
        source: PolarsError,
    },
}

/// What the cleaning pass removed and filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_dropped: usize,
    pub filled: Vec<(String, usize)>,
}

/// Handles the cleaning pass from raw frame to typed table.
pub struct DataCleaner;

impl DataCleaner {
    /// Run the whole cleaning pass.
    ///
    /// Gaps are filled from the previous row of the table regardless of
    /// location, so interleaved locations can borrow each other's values.
    pub fn clean(df: &DataFrame) -> Result<(Table, CleanReport), CleanError> {
        let projected = df.select(COLUMNS_OF_INTEREST)?;
        let rows_in = projected.height();

        let dates = Self::parse_dates(projected.column("date")?)?;
        let locations = projected
            .column("location")?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let locations = locations.str()?;

        let keep: BooleanChunked = dates
            .iter()
            .zip(locations.into_iter())
            .map(|(date, location)| Some(date.is_some() && location.is_some()))
            .collect();
        let kept_dates: Vec<NaiveDate> = dates
            .iter()
            .zip(locations.into_iter())
            .filter_map(|(date, location)| location.and(*date))
            .collect();
        let kept = projected.filter(&keep)?;
        let rows_dropped = rows_in - kept.height();
        if rows_dropped > 0 {
            info!(rows_dropped, "Dropped rows missing date or location");
        }

        let kept_locations = kept
            .column("location")?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let kept_locations = kept_locations.str()?;

        let mut filled = Vec::new();
        let mut numeric: Vec<Vec<Option<f64>>> = Vec::new();
        for name in &COLUMNS_OF_INTEREST[2..] {
            let (values, count) = Self::forward_fill(kept.column(name)?)?;
            debug!(column = *name, filled = count, "Forward-filled column");
            filled.push((name.to_string(), count));
            numeric.push(values);
        }

        let table: Table = (0..kept.height())
            .filter_map(|i| {
                let location = kept_locations.get(i)?;
                let mut record = Record::new(location, kept_dates[i]);
                record.total_cases = numeric[0][i];
                record.new_cases = numeric[1][i];
                record.total_deaths = numeric[2][i];
                record.new_deaths = numeric[3][i];
                record.total_vaccinations = numeric[4][i];
                record.population = numeric[5][i];
                Some(record)
            })
            .collect();

        info!(rows = table.len(), "Cleaned table");
        Ok((
            table,
            CleanReport {
                rows_in,
                rows_dropped,
                filled,
            },
        ))
    }

    /// Parse every date cell. Missing cells stay `None`; anything else that
    /// does not parse aborts.
    fn parse_dates(column: &Column) -> Result<Vec<Option<NaiveDate>>, CleanError> {
        let as_str = column.as_materialized_series().cast(&DataType::String)?;
        let as_str = as_str.str()?;

        as_str
            .into_iter()
            .enumerate()
            .map(|(row, value)| match value.map(str::trim) {
                None | Some("") => Ok(None),
                Some(raw) => Self::parse_date(raw).map(Some).ok_or_else(|| {
                    CleanError::InvalidDate {
                        row,
                        value: raw.to_string(),
                    }
                }),
            })
            .collect()
    }

    /// Parse a calendar date, accepting timestamps by keeping their date part.
    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|dt| dt.date())
            })
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }

    /// Forward-fill a numeric column in table order. NaN counts as missing.
    ///
    /// Returns the filled values and how many gaps were filled.
    fn forward_fill(column: &Column) -> Result<(Vec<Option<f64>>, usize), CleanError> {
        let series = column
            .as_materialized_series()
            .strict_cast(&DataType::Float64)
            .map_err(|source| CleanError::InvalidNumber {
                column: column.name().to_string(),
                source,
            })?;
        let series: Float64Chunked = series
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        let series = series.with_name(column.name().clone()).into_series();

        let nulls_before = series.null_count();
        let filled = series.fill_null(FillNullStrategy::Forward(None))?;
        let count = nulls_before - filled.null_count();

        let values = filled.f64()?.into_iter().collect();
        Ok((values, count))
    }
}
