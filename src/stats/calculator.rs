//! Summary Calculator Module
//! Handles the counts behind the report overview: rows per region, per store
//! brand, and the most frequent items.

use crate::data::{Dataset, DESCRIPTION, ITEM_CODE, REGION, STORE_BRAND};
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Number of items listed by default in the frequency ranking.
pub const DEFAULT_TOP_ITEMS: usize = 10;

/// Row count for one distinct value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub value: String,
    pub count: usize,
}

/// Row count for one item, with the description of its first row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFrequency {
    pub item_code: String,
    pub description: String,
    pub count: usize,
}

/// Overview of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_rows: usize,
    pub regions: Vec<CountEntry>,
    pub store_brands: Vec<CountEntry>,
    pub top_items: Vec<ItemFrequency>,
}

/// Handles summary counts over a dataset.
pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Count rows per distinct value of a text column.
    ///
    /// Highest count first; ties are ordered by value. Missing values are skipped.
    pub fn value_counts(dataset: &Dataset, column: &str) -> Result<Vec<CountEntry>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in dataset.text_column(column)?.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut entries: Vec<CountEntry> = counts
            .into_iter()
            .map(|(value, count)| CountEntry {
                value: value.to_string(),
                count,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        Ok(entries)
    }

    pub fn region_counts(dataset: &Dataset) -> Result<Vec<CountEntry>> {
        Self::value_counts(dataset, REGION)
    }

    pub fn brand_counts(dataset: &Dataset) -> Result<Vec<CountEntry>> {
        Self::value_counts(dataset, STORE_BRAND)
    }

    /// The `n` most frequent item codes.
    pub fn top_items(dataset: &Dataset, n: usize) -> Result<Vec<ItemFrequency>> {
        let codes = dataset.text_column(ITEM_CODE)?;
        let descriptions = dataset.text_column(DESCRIPTION)?;

        let mut first_description: HashMap<&str, &str> = HashMap::new();
        for (code, description) in codes.into_iter().zip(descriptions.into_iter()) {
            if let Some(code) = code {
                first_description
                    .entry(code)
                    .or_insert(description.unwrap_or_default());
            }
        }

        Ok(Self::value_counts(dataset, ITEM_CODE)?
            .into_iter()
            .take(n)
            .map(|entry| ItemFrequency {
                description: first_description
                    .get(entry.value.as_str())
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                item_code: entry.value,
                count: entry.count,
            })
            .collect())
    }

    /// Compute every summary count.
    pub fn summarize(dataset: &Dataset, top_n: usize) -> Result<Summary> {
        Ok(Summary {
            total_rows: dataset.len(),
            regions: Self::region_counts(dataset)?,
            store_brands: Self::brand_counts(dataset)?,
            top_items: Self::top_items(dataset, top_n)?,
        })
    }
}
