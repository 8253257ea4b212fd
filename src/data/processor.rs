//! Data Processor Module
//! Handles flag normalization: textual Yes/No columns become boolean columns.

use crate::data::loader::Dataset;
use crate::error::{ReportError, Result};
use polars::prelude::*;
use tracing::debug;

pub const REUSED_SPM: &str = "Reused SPM";
pub const PB_AVAILABLE: &str = "PB Available";
pub const STORE_HALAL: &str = "Store Halal";
pub const PRODUCT_NON_HALAL: &str = "Product Non-Halal";

/// Flag columns known to appear in report exports.
pub const KNOWN_FLAG_COLUMNS: [&str; 4] =
    [REUSED_SPM, PB_AVAILABLE, STORE_HALAL, PRODUCT_NON_HALAL];

/// Known flag columns present in the dataset, in [`KNOWN_FLAG_COLUMNS`] order.
pub fn detect_flag_columns(dataset: &Dataset) -> Vec<String> {
    KNOWN_FLAG_COLUMNS
        .iter()
        .filter(|name| dataset.has_column(name))
        .map(|name| name.to_string())
        .collect()
}

/// Convert the given flag columns to booleans.
///
/// "yes"/"no" match case-insensitively; missing values become `false`.
/// Columns absent from the dataset are skipped. Columns that are already
/// boolean are kept, so normalizing twice gives the same result as once.
pub fn normalize_flags<S: AsRef<str>>(
    dataset: &Dataset,
    flag_columns: &[S],
) -> Result<Dataset> {
    let mut df = dataset.frame().clone();

    for name in flag_columns {
        let name: &str = name.as_ref();
        let Ok(column) = df.column(name) else {
            continue;
        };

        let values: Vec<bool> = match column.dtype() {
            DataType::Boolean => column
                .bool()?
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect(),
            DataType::String => column
                .str()?
                .into_iter()
                .enumerate()
                .map(|(idx, value)| match value {
                    Some(text) => parse_flag(name, idx, text),
                    None => Ok(false),
                })
                .collect::<Result<_>>()?,
            other => {
                return Err(ReportError::Schema(format!(
                    "Column '{}' has type {} and cannot be used as a flag",
                    name, other
                )))
            }
        };

        df.with_column(Column::new(name.into(), values))?;
        debug!(column = name, "normalized flag column");
    }

    Ok(Dataset::new(df))
}

/// Normalize every known flag column present in the dataset.
pub fn normalize_known_flags(dataset: &Dataset) -> Result<Dataset> {
    normalize_flags(dataset, &detect_flag_columns(dataset))
}

fn parse_flag(column: &str, idx: usize, text: &str) -> Result<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("yes") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("no") {
        Ok(false)
    } else {
        Err(ReportError::Schema(format!(
            "Ambiguous flag value '{}' in column '{}' at row {}",
            text,
            column,
            idx + 1
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::DataLoader;

    const SAMPLE_CSV: &str = "\
Region,Store Code,Store Name,Store Brand,Item Code,Description,Unit Size,Price,Start Date,End Date,Language,SPM Code,Store Halal,PB Available
R1,S1,Store A,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,,Yes,no
R1,S2,Store B,Brand X,I1,Tea,1kg,1.50,2025-01-01,2025-01-15,EN,,NO,
R2,S3,Store C,Brand Y,I2,Rice,5kg,9.99,2025-01-01,2025-01-15,FR,, yes ,YES
";

    fn sample() -> Dataset {
        DataLoader::new().load_reader(SAMPLE_CSV.as_bytes()).unwrap()
    }

    fn flag_values(dataset: &Dataset, name: &str) -> Vec<bool> {
        dataset
            .rows()
            .unwrap()
            .iter()
            .map(|row| row.flags[name])
            .collect()
    }

    #[test]
    fn detects_only_present_flag_columns() {
        assert_eq!(detect_flag_columns(&sample()), vec![PB_AVAILABLE, STORE_HALAL]);
    }

    #[test]
    fn yes_no_become_booleans() {
        let normalized = normalize_known_flags(&sample()).unwrap();
        assert!(normalized.is_flag_column(STORE_HALAL));
        assert_eq!(flag_values(&normalized, STORE_HALAL), vec![true, false, true]);
        assert_eq!(flag_values(&normalized, PB_AVAILABLE), vec![false, false, true]);
    }

    #[test]
    fn input_is_left_untouched() {
        let dataset = sample();
        let _ = normalize_known_flags(&dataset).unwrap();
        assert!(!dataset.is_flag_column(STORE_HALAL));
    }

    #[test]
    fn absent_columns_are_omitted() {
        let normalized = normalize_flags(&sample(), &[REUSED_SPM]).unwrap();
        assert!(!normalized.has_column(REUSED_SPM));
        assert!(!normalized.is_flag_column(STORE_HALAL));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let once = normalize_known_flags(&sample()).unwrap();
        let twice = normalize_known_flags(&once).unwrap();
        assert!(once.frame().equals_missing(twice.frame()));
    }

    #[test]
    fn unknown_flag_value_is_rejected() {
        let data = SAMPLE_CSV.replacen(",Yes,no", ",Maybe,no", 1);
        let dataset = DataLoader::new().load_reader(data.as_bytes()).unwrap();
        let result = normalize_flags(&dataset, &[STORE_HALAL]);
        assert!(matches!(result, Err(ReportError::Schema(m)) if m.contains("Maybe")));
    }
}
