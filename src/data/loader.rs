//! Dataset loading
//!
//! File format is sniffed from the content itself (magic bytes / structure),
//! never from the client-supplied filename.

use crate::error::{FraudError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

/// Detected dataset file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Json,
    Parquet,
}

impl DataFormat {
    /// Safe storage extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
            DataFormat::Parquet => "parquet",
        }
    }

    /// Sniff the format from raw bytes. Parquet files start with the "PAR1"
    /// magic; JSON payloads start with '{' or '['; everything else is read as CSV.
    pub fn sniff(content: &[u8]) -> DataFormat {
        if content.starts_with(b"PAR1") {
            return DataFormat::Parquet;
        }
        let first = content
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .copied()
            .unwrap_or(0);
        if first == b'{' || first == b'[' {
            DataFormat::Json
        } else {
            DataFormat::Csv
        }
    }
}

/// Reads stored dataset files into DataFrames
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader;

impl DatasetLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw bytes into a DataFrame using the sniffed format
    pub fn load_bytes(&self, content: &[u8]) -> Result<DataFrame> {
        match DataFormat::sniff(content) {
            DataFormat::Csv => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(1000))
                .into_reader_with_file_handle(Cursor::new(content))
                .finish()
                .map_err(|e| FraudError::DataError(e.to_string())),
            DataFormat::Json => JsonReader::new(Cursor::new(content))
                .finish()
                .map_err(|e| FraudError::DataError(e.to_string())),
            DataFormat::Parquet => ParquetReader::new(Cursor::new(content))
                .finish()
                .map_err(|e| FraudError::DataError(e.to_string())),
        }
    }

    /// Load a previously stored dataset file, dispatching on its extension
    pub fn load_path(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_lowercase();

        let file = File::open(path).map_err(|e| FraudError::DataError(e.to_string()))?;

        match ext.as_str() {
            "parquet" => ParquetReader::new(file)
                .finish()
                .map_err(|e| FraudError::DataError(e.to_string())),
            "json" => JsonReader::new(file)
                .finish()
                .map_err(|e| FraudError::DataError(e.to_string())),
            _ => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(1000))
                .into_reader_with_file_handle(file)
                .finish()
                .map_err(|e| FraudError::DataError(e.to_string())),
        }
    }
}
