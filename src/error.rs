//! Error types shared by the loader, normalizer, filter engine and consolidator.

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("The input contains no data rows")]
    EmptyInput,
    #[error("Failed to parse CSV: {0}")]
    Parse(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data frame error: {0}")]
    Frame(#[from] PolarsError),
}

impl ReportError {
    pub(crate) fn missing_columns(columns: &[&str]) -> Self {
        ReportError::Schema(format!(
            "Missing required columns: {}",
            columns.join(", ")
        ))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
