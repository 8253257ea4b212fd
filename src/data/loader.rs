//! CSV Data Loader Module
//! Handles CSV loading, required-column validation and row extraction using Polars.

use crate::cache::DatasetCache;
use crate::error::{ReportError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info};

pub const REGION: &str = "Region";
pub const STORE_CODE: &str = "Store Code";
pub const STORE_NAME: &str = "Store Name";
pub const STORE_BRAND: &str = "Store Brand";
pub const ITEM_CODE: &str = "Item Code";
pub const DESCRIPTION: &str = "Description";
pub const UNIT_SIZE: &str = "Unit Size";
pub const PRICE: &str = "Price";
pub const START_DATE: &str = "Start Date";
pub const END_DATE: &str = "End Date";
pub const LANGUAGE: &str = "Language";
pub const SPM_CODE: &str = "SPM Code";

/// Columns every report export must carry, in export order.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    REGION,
    STORE_CODE,
    STORE_NAME,
    STORE_BRAND,
    ITEM_CODE,
    DESCRIPTION,
    UNIT_SIZE,
    PRICE,
    START_DATE,
    END_DATE,
    LANGUAGE,
    SPM_CODE,
];

/// Where a report is read from.
pub enum DataSource<'a> {
    Path(&'a Path),
    /// An open stream positioned at its start.
    Reader(&'a mut dyn Read),
}

impl DataSource<'_> {
    fn read_bytes(self) -> Result<Vec<u8>> {
        match self {
            DataSource::Path(path) => {
                if !path.is_file() {
                    return Err(ReportError::NotFound(path.display().to_string()));
                }
                Ok(fs::read(path)?)
            }
            DataSource::Reader(reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

/// One report record with the required columns as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub region: String,
    pub store_code: String,
    pub store_name: String,
    pub store_brand: String,
    pub item_code: String,
    pub description: String,
    pub unit_size: String,
    pub price: String,
    pub start_date: String,
    pub end_date: String,
    pub language: String,
    pub spm_code: Option<String>,
    /// Normalized flag columns only; text flags are not listed here.
    pub flags: BTreeMap<String, bool>,
}

/// An immutable, validated report table.
///
/// Every column is text except flag columns that went through
/// [`normalize_flags`](crate::data::normalize_flags), which are boolean.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Get a reference to the underlying DataFrame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get list of column names in input order.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    /// Whether `name` exists and already holds booleans.
    pub fn is_flag_column(&self, name: &str) -> bool {
        self.df
            .column(name)
            .map(|col| col.dtype() == &DataType::Boolean)
            .unwrap_or(false)
    }

    pub(crate) fn text_column(&self, name: &str) -> Result<&StringChunked> {
        Ok(self.df.column(name)?.str()?)
    }

    /// Distinct non-missing values of a text column, sorted.
    pub(crate) fn distinct_text(&self, name: &str) -> Result<Vec<String>> {
        let mut values: Vec<String> = self
            .text_column(name)?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    /// Materialize the table as typed rows, in input order.
    pub fn rows(&self) -> Result<Vec<Row>> {
        let text: Vec<&StringChunked> = REQUIRED_COLUMNS
            .iter()
            .map(|name| self.text_column(name))
            .collect::<Result<_>>()?;

        let mut flags: Vec<(String, &BooleanChunked)> = Vec::new();
        for col in self.df.get_columns() {
            if col.dtype() == &DataType::Boolean {
                flags.push((col.name().to_string(), col.bool()?));
            }
        }

        let field = |col: usize, idx: usize| text[col].get(idx).unwrap_or_default().to_string();

        let rows = (0..self.len())
            .map(|idx| Row {
                region: field(0, idx),
                store_code: field(1, idx),
                store_name: field(2, idx),
                store_brand: field(3, idx),
                item_code: field(4, idx),
                description: field(5, idx),
                unit_size: field(6, idx),
                price: field(7, idx),
                start_date: field(8, idx),
                end_date: field(9, idx),
                language: field(10, idx),
                spm_code: text[11].get(idx).map(str::to_string),
                flags: flags
                    .iter()
                    .map(|(name, values)| (name.clone(), values.get(idx).unwrap_or(false)))
                    .collect(),
            })
            .collect();

        Ok(rows)
    }
}

/// Handles report loading, optionally memoized through a [`DatasetCache`].
#[derive(Default)]
pub struct DataLoader {
    cache: Option<DatasetCache>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// A loader that reuses the parsed dataset when the same content is loaded again.
    pub fn with_cache() -> Self {
        Self {
            cache: Some(DatasetCache::new()),
        }
    }

    pub fn cache(&self) -> Option<&DatasetCache> {
        self.cache.as_ref()
    }

    /// Load and validate a report from a path or an open stream.
    pub fn load(&mut self, source: DataSource<'_>) -> Result<Dataset> {
        let bytes = source.read_bytes()?;
        let dataset = match self.cache.as_mut() {
            Some(cache) => cache.get_or_parse(bytes)?,
            None => parse_csv(bytes)?,
        };
        info!(
            rows = dataset.len(),
            columns = dataset.frame().width(),
            "loaded report"
        );
        Ok(dataset)
    }

    /// Load a CSV file.
    pub fn load_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<Dataset> {
        self.load(DataSource::Path(path.as_ref()))
    }

    /// Load CSV content from any reader.
    pub fn load_reader<R: Read>(&mut self, mut reader: R) -> Result<Dataset> {
        self.load(DataSource::Reader(&mut reader))
    }
}

/// Load a report without caching.
pub fn load(source: DataSource<'_>) -> Result<Dataset> {
    DataLoader::new().load(source)
}

/// Parse raw CSV bytes into a validated dataset. Every column is read as text.
pub(crate) fn parse_csv(bytes: Vec<u8>) -> Result<Dataset> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ReportError::EmptyInput);
    }

    check_structure(&bytes)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| ReportError::Parse(e.to_string()))?;

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| df.get_column_index(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ReportError::missing_columns(&missing));
    }

    if df.height() == 0 {
        return Err(ReportError::EmptyInput);
    }

    for name in [REGION, ITEM_CODE] {
        let values = df.column(name)?.str()?;
        let missing_at = values
            .into_iter()
            .position(|v| v.map_or(true, |text| text.trim().is_empty()));
        if let Some(idx) = missing_at {
            return Err(ReportError::Schema(format!(
                "Column '{}' is missing a value at row {}",
                name,
                idx + 1
            )));
        }
    }

    debug!(rows = df.height(), "parsed CSV");
    Ok(Dataset::new(df))
}

/// Reject ragged rows, duplicate header names and non-UTF-8 content.
fn check_structure(bytes: &[u8]) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ReportError::Parse(e.to_string()))?
        .clone();
    let mut seen = HashSet::new();
    if let Some(duplicate) = headers.iter().find(|name| !seen.insert(*name)) {
        return Err(ReportError::Parse(format!(
            "duplicate column name '{}' in header",
            duplicate
        )));
    }

    for (line_num, result) in reader.records().enumerate() {
        result.map_err(|e| {
            ReportError::Parse(format!("CSV parse error at line {}: {}", line_num + 2, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Region,Store Code,Store Name,Store Brand,Item Code,Description,Unit Size,Price,Start Date,End Date,Language,SPM Code";

    fn csv(lines: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for line in lines {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out
    }

    #[test]
    fn load_from_reader_keeps_order() {
        let data = csv(&[
            "R1,S1,Store A,Brand X,I2,Second,1kg,2.50,2025-01-01,2025-01-15,EN,",
            "R1,S2,Store B,Brand X,I1,First,1kg,1.50,2025-01-01,2025-01-15,EN,SPM9",
        ]);
        let dataset = DataLoader::new().load_reader(data.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let rows = dataset.rows().unwrap();
        assert_eq!(rows[0].item_code, "I2");
        assert_eq!(rows[0].spm_code, None);
        assert_eq!(rows[1].spm_code.as_deref(), Some("SPM9"));
        assert_eq!(rows[1].price, "1.50");
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let data = csv(&[
            "R1,S1,\"Store, Main St\",Brand X,I1,\"Tea, green\",1kg,1.50,2025-01-01,2025-01-15,EN,",
        ]);
        let rows = load(DataSource::Reader(&mut data.as_bytes()))
            .unwrap()
            .rows()
            .unwrap();
        assert_eq!(rows[0].store_name, "Store, Main St");
        assert_eq!(rows[0].description, "Tea, green");
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load(DataSource::Path(Path::new("no/such/report.csv")));
        assert!(matches!(result, Err(ReportError::NotFound(_))));
    }

    #[test]
    fn load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            csv(&["R1,S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,"])
        )
        .unwrap();
        let dataset = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn empty_and_header_only_inputs_are_empty() {
        assert!(matches!(
            DataLoader::new().load_reader("".as_bytes()),
            Err(ReportError::EmptyInput)
        ));
        assert!(matches!(
            DataLoader::new().load_reader(" \n".as_bytes()),
            Err(ReportError::EmptyInput)
        ));
        assert!(matches!(
            DataLoader::new().load_reader(csv(&[]).as_bytes()),
            Err(ReportError::EmptyInput)
        ));
    }

    #[test]
    fn missing_columns_are_all_listed() {
        let data = "Region,Store Code,Item Code\nR1,S1,I1\n";
        let err = DataLoader::new().load_reader(data.as_bytes()).unwrap_err();
        let message = match err {
            ReportError::Schema(message) => message,
            other => panic!("expected schema error, got {other:?}"),
        };
        for name in [STORE_NAME, STORE_BRAND, DESCRIPTION, PRICE, LANGUAGE, SPM_CODE] {
            assert!(message.contains(name), "{message} should mention {name}");
        }
        assert!(!message.contains("Region,"));
    }

    #[test]
    fn row_wider_than_header_is_a_parse_error() {
        let data = csv(&[
            "R1,S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,,extra,more",
        ]);
        let result = DataLoader::new().load_reader(data.as_bytes());
        assert!(matches!(result, Err(ReportError::Parse(_))));
    }

    #[test]
    fn row_narrower_than_header_is_a_parse_error() {
        let data = csv(&[
            "R1,S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,",
            "R1,S2,Store B,Brand X,I2,Rice",
        ]);
        let result = DataLoader::new().load_reader(data.as_bytes());
        assert!(matches!(result, Err(ReportError::Parse(_))));
    }

    #[test]
    fn duplicate_header_is_a_parse_error() {
        let data = format!(
            "{},Region\nR1,S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,,R2\n",
            HEADER
        );
        let result = DataLoader::new().load_reader(data.as_bytes());
        assert!(matches!(result, Err(ReportError::Parse(m)) if m.contains(REGION)));
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        let data = csv(&["R1,\"S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,"]);
        let result = DataLoader::new().load_reader(data.as_bytes());
        assert!(matches!(result, Err(ReportError::Parse(_))));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let mut data = csv(&[]).into_bytes();
        data.extend_from_slice(
            b"R1,S1,Store A,Brand X,I1,\xff\xfe,1kg,1.50,2025-01-01,2025-01-15,EN,\n",
        );
        let result = DataLoader::new().load_reader(data.as_slice());
        assert!(matches!(result, Err(ReportError::Parse(_))));
    }

    #[test]
    fn quoted_empty_region_is_rejected() {
        let data = csv(&["\"\",S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,"]);
        let result = DataLoader::new().load_reader(data.as_bytes());
        assert!(matches!(result, Err(ReportError::Schema(m)) if m.contains(REGION)));
    }

    #[test]
    fn missing_item_code_is_rejected() {
        let data = csv(&["R1,S1,Store A,Brand X,,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,"]);
        let result = DataLoader::new().load_reader(data.as_bytes());
        assert!(matches!(result, Err(ReportError::Schema(m)) if m.contains(ITEM_CODE)));
    }
}
