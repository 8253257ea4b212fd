//! Filter Engine Module
//! Narrows a dataset with optional, AND-combined predicates.

use crate::data::loader::{Dataset, ITEM_CODE, REGION, STORE_CODE};
use crate::data::processor::{
    normalize_flags, PB_AVAILABLE, PRODUCT_NON_HALAL, REUSED_SPM, STORE_HALAL,
};
use crate::error::{ReportError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Filter options. Every option is independent; unset options impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_halal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reused_spm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_non_halal: Option<bool>,
    /// Any other flag column, by column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn store_code(mut self, store_code: impl Into<String>) -> Self {
        self.store_code = Some(store_code.into());
        self
    }

    pub fn item_code(mut self, item_code: impl Into<String>) -> Self {
        self.item_code = Some(item_code.into());
        self
    }

    pub fn store_halal(mut self, value: bool) -> Self {
        self.store_halal = Some(value);
        self
    }

    pub fn pb_available(mut self, value: bool) -> Self {
        self.pb_available = Some(value);
        self
    }

    pub fn flag(mut self, column: impl Into<String>, value: bool) -> Self {
        self.flags.insert(column.into(), value);
        self
    }

    /// Parse criteria from a JSON object such as `{"region": "Region1", "storeHalal": true}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ReportError::InvalidFilter(e.to_string()))
    }

    /// Apply one `key=value` option. Flag columns outside the named options use `flag:<Column>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "region" => self.region = Some(value.to_string()),
            "storeCode" => self.store_code = Some(value.to_string()),
            "itemCode" => self.item_code = Some(value.to_string()),
            "storeHalal" => self.store_halal = Some(parse_bool(key, value)?),
            "pbAvailable" => self.pb_available = Some(parse_bool(key, value)?),
            "reusedSpm" => self.reused_spm = Some(parse_bool(key, value)?),
            "productNonHalal" => self.product_non_halal = Some(parse_bool(key, value)?),
            _ => match key.strip_prefix("flag:") {
                Some(column) if !column.is_empty() => {
                    self.flags.insert(column.to_string(), parse_bool(key, value)?);
                }
                _ => {
                    return Err(ReportError::InvalidFilter(format!(
                        "unknown filter key '{}'",
                        key
                    )))
                }
            },
        }
        Ok(())
    }

    /// Build criteria from `key=value` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut criteria = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ReportError::InvalidFilter(format!("expected key=value, got '{}'", pair))
            })?;
            criteria.set(key.trim(), value.trim())?;
        }
        Ok(criteria)
    }

    /// Every flag constraint as (column name, required value).
    pub fn flag_constraints(&self) -> Vec<(String, bool)> {
        let named = [
            (STORE_HALAL, self.store_halal),
            (PB_AVAILABLE, self.pb_available),
            (REUSED_SPM, self.reused_spm),
            (PRODUCT_NON_HALAL, self.product_non_halal),
        ];
        let mut constraints: Vec<(String, bool)> = named
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column.to_string(), v)))
            .collect();
        constraints.extend(
            self.flags
                .iter()
                .map(|(column, value)| (column.clone(), *value)),
        );
        constraints
    }

    fn text_constraints(&self) -> Vec<(&'static str, &str)> {
        [
            (REGION, self.region.as_deref()),
            (STORE_CODE, self.store_code.as_deref()),
            (ITEM_CODE, self.item_code.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text_constraints().is_empty() && self.flag_constraints().is_empty()
    }
}

impl FromStr for FilterCriteria {
    type Err = ReportError;

    /// Comma-separated `key=value` pairs, e.g. `region=Region1,storeHalal=yes`.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_pairs(s.split(',').filter(|part| !part.trim().is_empty()))
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ReportError::InvalidFilter(format!(
            "'{}' expects a boolean, got '{}'",
            key, value
        ))),
    }
}

/// Keep the rows matching every criterion, in their original order.
///
/// Flag constraints on text columns normalize those columns first, so the
/// returned dataset carries them as booleans.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Result<Dataset> {
    let flags = criteria.flag_constraints();
    if let Some((column, _)) = flags.iter().find(|(column, _)| !dataset.has_column(column)) {
        return Err(ReportError::InvalidFilter(format!(
            "flag column '{}' is not present in the report",
            column
        )));
    }

    if criteria.is_empty() {
        return Ok(dataset.clone());
    }

    let flag_columns: Vec<&str> = flags.iter().map(|(column, _)| column.as_str()).collect();
    let source = normalize_flags(dataset, &flag_columns)?;

    let mut predicate = lit(true);
    for (column, value) in criteria.text_constraints() {
        predicate = predicate.and(col(column).eq(lit(value)));
    }
    for (column, value) in &flags {
        predicate = predicate.and(col(column.as_str()).eq(lit(*value)));
    }

    let filtered = source.frame().clone().lazy().filter(predicate).collect()?;
    debug!(
        before = dataset.len(),
        after = filtered.height(),
        "filtered report"
    );
    Ok(Dataset::new(filtered))
}
