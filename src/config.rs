//! Configuration Module
//! Command-line arguments and the resolved analysis settings.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

/// Columns kept by the cleaner, in output order.
pub const COLUMNS_OF_INTEREST: [&str; 8] = [
    "date",
    "location",
    "total_cases",
    "new_cases",
    "total_deaths",
    "new_deaths",
    "total_vaccinations",
    "population",
];

pub const DEFAULT_COUNTRIES: [&str; 3] = ["Kenya", "United States", "India"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least one country is required")]
    NoCountries,
    #[error("--head-rows must be at least 1")]
    InvalidHeadRows,
}

/// Output image format for rendered charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "covid_eda")]
#[command(about = "Exploratory analysis of the OWID COVID-19 dataset", long_about = None)]
#[command(version)]
pub struct Args {
    /// CSV file to analyse
    #[arg(short, long, env = "COVID_EDA_INPUT", default_value = "owid-covid-data.csv")]
    pub input: PathBuf,

    /// Countries to compare (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_values_t = DEFAULT_COUNTRIES.map(String::from))]
    pub countries: Vec<String>,

    /// Directory the charts and summary are written to
    #[arg(short, long, default_value = "charts")]
    pub out_dir: PathBuf,

    /// Chart image format
    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    pub format: ImageFormat,

    /// Number of sample rows printed after loading
    #[arg(long, default_value_t = 5)]
    pub head_rows: usize,

    /// Rows scanned when inferring the CSV schema
    #[arg(long, default_value_t = 10000)]
    pub infer_schema_length: usize,

    /// Open each chart with the system viewer once written
    #[arg(long)]
    pub open: bool,
}

/// Resolved settings for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub countries: Vec<String>,
    pub out_dir: PathBuf,
    pub format: ImageFormat,
    pub head_rows: usize,
    pub infer_schema_length: usize,
    pub open_charts: bool,
}

impl Args {
    pub fn into_config(self) -> Result<AnalysisConfig, ConfigError> {
        let countries: Vec<String> = self
            .countries
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if countries.is_empty() {
            return Err(ConfigError::NoCountries);
        }
        if self.head_rows == 0 {
            return Err(ConfigError::InvalidHeadRows);
        }

        Ok(AnalysisConfig {
            input: self.input,
            countries,
            out_dir: self.out_dir,
            format: self.format,
            head_rows: self.head_rows,
            infer_schema_length: self.infer_schema_length,
            open_charts: self.open,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_analysis() {
        let config = Args::parse_from(["covid_eda"]).into_config().unwrap();
        assert_eq!(config.input, PathBuf::from("owid-covid-data.csv"));
        assert_eq!(config.countries, vec!["Kenya", "United States", "India"]);
        assert_eq!(config.format, ImageFormat::Png);
        assert_eq!(config.head_rows, 5);
        assert!(!config.open_charts);
    }

    #[test]
    fn countries_split_on_commas() {
        let config = Args::parse_from(["covid_eda", "--countries", "Peru, Chile"])
            .into_config()
            .unwrap();
        assert_eq!(config.countries, vec!["Peru", "Chile"]);
    }

    #[test]
    fn empty_country_list_rejected() {
        let result = Args::parse_from(["covid_eda", "--countries", " "]).into_config();
        assert!(matches!(result, Err(ConfigError::NoCountries)));
    }

    #[test]
    fn svg_format_selects_extension() {
        let config = Args::parse_from(["covid_eda", "--format", "svg"])
            .into_config()
            .unwrap();
        assert_eq!(config.format.extension(), "svg");
    }
}
