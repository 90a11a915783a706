//! Data loading utilities

use crate::error::{HappinessError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Cell contents read as missing, besides empty fields
pub const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Loads delimited tabular files into a polars [`DataFrame`]
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Field separator
    delimiter: u8,
    /// Rows used for schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a loader for comma-separated files with a header row
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            infer_schema_length: 1000,
        }
    }

    /// Set the field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a CSV file. The file must exist and start with a header row.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path).map_err(|e| {
            HappinessError::DataError(format!("cannot open {}: {}", path.display(), e))
        })?;

        let null_values = MISSING_TOKENS.iter().map(|t| PlSmallStr::from(*t)).collect();
        let parse_opts = CsvParseOptions::default()
            .with_separator(self.delimiter)
            .with_null_values(Some(NullValues::AllColumns(null_values)));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| {
                HappinessError::DataError(format!("cannot parse {}: {}", path.display(), e))
            })?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );

        Ok(df)
    }
}

/// Writes data frames back to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;

        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(|e| HappinessError::DataError(e.to_string()))
    }
}
