//! CSV Data Loader Module
//! Handles CSV file loading and column inspection using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Cell values read as missing, the same set pandas' `read_csv` uses.
const NA_VALUES: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
            infer_schema_length: 10000,
        }
    }

    /// Wrap an already materialised DataFrame.
    #[cfg(test)]
    pub fn from_dataframe(df: DataFrame) -> Self {
        Self {
            df: Some(df),
            ..Self::new()
        }
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Load a CSV file with a header row. Malformed input aborts the load.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }
        self.file_path = Some(file_path.to_path_buf());

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_null_values(Some(NullValues::AllColumns(
                NA_VALUES.iter().map(|v| (*v).into()).collect(),
            )))
            .finish()?
            .collect()?;

        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "Loaded CSV"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First `n` rows of the loaded DataFrame.
    pub fn head(&self, n: usize) -> Option<DataFrame> {
        self.df.as_ref().map(|df| df.head(Some(n)))
    }

    /// Missing-value count per column, in column order.
    pub fn null_counts(&self) -> Vec<(String, usize)> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Hand the loaded DataFrame over to the next stage.
    pub fn into_dataframe(self) -> Result<DataFrame, LoaderError> {
        self.df.ok_or(LoaderError::NoData)
    }

    /// Get file path.
    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn missing_file_is_fatal() {
        let mut loader = DataLoader::new();
        let err = loader
            .load_csv(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
        assert_eq!(loader.get_row_count(), 0);
    }

    #[test]
    fn loads_columns_and_null_counts() {
        let file = write_csv(
            "date,location,total_cases,extra\n\
             2021-01-01,Kenya,10,a\n\
             2021-01-02,Kenya,,b\n\
             2021-01-03,,15,\n",
        );
        let mut loader = DataLoader::new();
        loader.load_csv(file.path()).unwrap();

        assert_eq!(loader.get_row_count(), 3);
        assert_eq!(
            loader.get_columns(),
            vec!["date", "location", "total_cases", "extra"]
        );
        let nulls = loader.null_counts();
        assert_eq!(nulls[0], ("date".to_string(), 0));
        assert_eq!(nulls[1], ("location".to_string(), 1));
        assert_eq!(nulls[2], ("total_cases".to_string(), 1));
        assert_eq!(loader.head(2).map(|h| h.height()), Some(2));
        assert_eq!(loader.get_file_path().map(|p| p.as_path()), Some(file.path()));
    }

    #[test]
    fn pandas_na_tokens_read_as_missing() {
        let file = write_csv(
            "location,total_cases\n\
             Kenya,10\n\
             Kenya,NaN\n\
             Kenya,NA\n\
             Kenya,N/A\n\
             Kenya,15\n",
        );
        let mut loader = DataLoader::new();
        loader.load_csv(file.path()).unwrap();

        let nulls = loader.null_counts();
        assert_eq!(nulls[1], ("total_cases".to_string(), 3));
    }
}
