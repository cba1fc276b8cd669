//! COVID-19 EDA - Exploratory analysis of the OWID COVID-19 dataset
//!
//! Loads the CSV export, cleans it, compares a few countries and writes
//! static charts plus a summary of observations.

mod charts;
mod config;
mod data;
mod report;
mod stats;

use anyhow::{Context, Result};
use charts::{ChartPlotter, StaticChartRenderer};
use clap::Parser;
use config::{AnalysisConfig, Args};
use data::{DataCleaner, DataLoader};
use report::{AnalysisSummary, ConsoleReport};
use stats::{Insights, StatsCalculator};
use std::io::{self, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    run(&config)
}

/// One pass of the pipeline: load, clean, filter/derive, present.
fn run(config: &AnalysisConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut loader = DataLoader::new().with_infer_schema_length(config.infer_schema_length);
    loader
        .load_csv(&config.input)
        .with_context(|| format!("loading {}", config.input.display()))?;
    ConsoleReport::write_overview(&mut out, &loader, config.head_rows)?;

    let raw = loader.into_dataframe()?;
    let (table, clean_report) = DataCleaner::clean(&raw).context("cleaning dataset")?;
    drop(raw);
    ConsoleReport::write_cleaning(&mut out, &clean_report)?;

    let filtered = StatsCalculator::filter_locations(table, &config.countries);
    info!(rows = filtered.len(), countries = ?config.countries, "Filtered table");
    let undefined_rates = StatsCalculator::death_rates(&filtered)
        .iter()
        .filter(|rate| !rate.is_finite())
        .count();
    debug!(rows = undefined_rates, "Rows with undefined death rate");
    let snapshot = StatsCalculator::latest_snapshot(&filtered);

    let renderer = StaticChartRenderer::new(&config.out_dir, config.format)?;
    let mut written = Vec::new();
    for chart in ChartPlotter::all_charts(&filtered, &snapshot, &config.countries) {
        let path = renderer
            .render(&chart)
            .with_context(|| format!("rendering {}", chart.title()))?;
        if config.open_charts {
            StaticChartRenderer::show(&path);
        }
        written.push(path);
    }

    let insights = Insights::compute(&filtered, &snapshot);
    ConsoleReport::write_snapshot(&mut out, &snapshot)?;
    ConsoleReport::write_insights(&mut out, &insights)?;
    out.flush()?;

    let summary_path = config.out_dir.join("summary.json");
    report::write_summary(
        &summary_path,
        &AnalysisSummary {
            input: &config.input,
            countries: &config.countries,
            rows_loaded: clean_report.rows_in,
            rows_dropped: clean_report.rows_dropped,
            rows_analysed: filtered.len(),
            snapshot: &snapshot,
            insights: &insights,
            charts: &written,
        },
    )?;

    info!(charts = written.len(), out_dir = %config.out_dir.display(), "Analysis complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Table;
    use tempfile::NamedTempFile;

    fn pipeline(csv: &str, countries: &[&str]) -> Table {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(csv.as_bytes()).unwrap();
        file.flush().unwrap();

        let mut loader = DataLoader::new();
        loader.load_csv(file.path()).unwrap();
        let (table, _) = DataCleaner::clean(&loader.into_dataframe().unwrap()).unwrap();
        let countries: Vec<String> = countries.iter().map(|c| c.to_string()).collect();
        StatsCalculator::filter_locations(table, &countries)
    }

    const HEADER: &str = "iso_code,continent,location,date,total_cases,new_cases,\
total_deaths,new_deaths,total_vaccinations,population\n";

    #[test]
    fn kenya_three_day_scenario() {
        let csv = format!(
            "{HEADER}\
             KEN,Africa,Kenya,2021-01-01,10,10,1,1,,53000000\n\
             KEN,Africa,Kenya,2021-01-02,,,1,0,,53000000\n\
             KEN,Africa,Kenya,2021-01-03,15,5,2,1,,53000000\n"
        );
        let table = pipeline(&csv, &["Kenya"]);

        let cases: Vec<_> = table.iter().map(|r| r.total_cases).collect();
        assert_eq!(cases, vec![Some(10.0), Some(10.0), Some(15.0)]);
        assert!(table.iter().all(|r| r.total_vaccinations.is_none()));
    }

    #[test]
    fn zero_cases_and_deaths_give_non_finite_rate() {
        let csv = format!(
            "{HEADER}\
             KEN,Africa,Kenya,2020-03-01,0,0,0,0,0,53000000\n"
        );
        let table = pipeline(&csv, &["Kenya"]);
        let rates = StatsCalculator::death_rates(&table);
        assert_eq!(rates.len(), 1);
        assert!(!rates[0].is_finite());
    }

    #[test]
    fn interleaved_locations_leak_filled_values() {
        let csv = format!(
            "{HEADER}\
             KEN,Africa,Kenya,2021-01-01,10,,,,,53000000\n\
             IND,Asia,India,2021-01-01,,,,,,1400000000\n\
             KEN,Africa,Kenya,2021-01-02,12,,,,,53000000\n"
        );
        let table = pipeline(&csv, &["Kenya", "India"]);

        assert_eq!(table[1].location, "India");
        assert_eq!(table[1].total_cases, Some(10.0));
    }

    #[test]
    fn nan_literal_forward_filled() {
        let csv = format!(
            "{HEADER}\
             KEN,Africa,Kenya,2021-01-01,10,,,,,53000000\n\
             KEN,Africa,Kenya,2021-01-02,NaN,,,,,53000000\n\
             KEN,Africa,Kenya,2021-01-03,15,,,,,53000000\n"
        );
        let table = pipeline(&csv, &["Kenya"]);

        let cases: Vec<_> = table.iter().map(|r| r.total_cases).collect();
        assert_eq!(cases, vec![Some(10.0), Some(10.0), Some(15.0)]);
    }

    #[test]
    fn malformed_numeric_cell_aborts_cleaning() {
        let csv = format!(
            "{HEADER}\
             KEN,Africa,Kenya,2021-01-01,10,,,,,53000000\n\
             KEN,Africa,Kenya,2021-01-02,abc,,,,,53000000\n\
             KEN,Africa,Kenya,2021-01-03,15,,,,,53000000\n"
        );
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(csv.as_bytes()).unwrap();
        file.flush().unwrap();

        let mut loader = DataLoader::new();
        loader.load_csv(file.path()).unwrap();
        let err = DataCleaner::clean(&loader.into_dataframe().unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("Column total_cases holds non-numeric values"));
    }

    #[test]
    fn snapshot_end_to_end() {
        let csv = format!(
            "{HEADER}\
             KEN,Africa,Kenya,2021-01-02,10,,,,100,1000\n\
             IND,Asia,India,2021-01-03,50,,,,400,2000\n\
             KEN,Africa,Kenya,2021-01-01,8,,,,50,1000\n\
             FRA,Europe,France,2021-01-05,90,,,,900,3000\n"
        );
        let table = pipeline(&csv, &["Kenya", "India"]);
        let snapshot = StatsCalculator::latest_snapshot(&table);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].record.location, "Kenya");
        assert_eq!(snapshot[0].vaccinated_pct, 10.0);
        assert_eq!(snapshot[1].record.location, "India");
        assert_eq!(snapshot[1].vaccinated_pct, 20.0);
    }
}
