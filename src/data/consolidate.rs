//! Consolidation Module
//! Folds one-row-per-store report data into a per-item, per-region/brand tree,
//! plus the read-only lookups a browser needs (regions, item codes, details).

use crate::data::filter::{filter, FilterCriteria};
use crate::data::loader::{Dataset, Row, DESCRIPTION, ITEM_CODE, REGION};
use crate::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// One store carrying an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEntry {
    pub store_code: String,
    pub store_name: String,
    /// Empty when the report has no SPM code for this store.
    pub spm_code: String,
    pub language: String,
}

/// Stores of one (region, store brand) pair for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionGroup {
    pub region: String,
    pub store_brand: String,
    /// Language of the first store in the group.
    pub language: String,
    pub stores: Vec<StoreEntry>,
}

/// An item with its attributes and every store it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedItem {
    pub item_code: String,
    pub description: String,
    pub unit_size: String,
    pub price: String,
    pub start_date: String,
    pub end_date: String,
    pub spm_code: String,
    pub regions: Vec<RegionGroup>,
}

impl ConsolidatedItem {
    /// Attributes come from the first row seen for the item.
    fn from_first_row(row: &Row) -> Self {
        Self {
            item_code: row.item_code.clone(),
            description: row.description.clone(),
            unit_size: row.unit_size.clone(),
            price: row.price.clone(),
            start_date: row.start_date.clone(),
            end_date: row.end_date.clone(),
            spm_code: row.spm_code.clone().unwrap_or_default(),
            regions: Vec::new(),
        }
    }

    pub fn store_count(&self) -> usize {
        self.regions.iter().map(|group| group.stores.len()).sum()
    }
}

/// An item code with the description shown next to it in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemListing {
    pub item_code: String,
    pub description: String,
}

struct ItemBuilder {
    item: ConsolidatedItem,
    group_index: HashMap<(String, String), usize>,
}

impl ItemBuilder {
    fn push(&mut self, row: Row) {
        let store = StoreEntry {
            store_code: row.store_code,
            store_name: row.store_name,
            spm_code: row.spm_code.unwrap_or_default(),
            language: row.language,
        };

        let key = (row.region, row.store_brand);
        match self.group_index.get(&key) {
            Some(&idx) => self.item.regions[idx].stores.push(store),
            None => {
                self.group_index.insert(key.clone(), self.item.regions.len());
                self.item.regions.push(RegionGroup {
                    region: key.0,
                    store_brand: key.1,
                    language: store.language.clone(),
                    stores: vec![store],
                });
            }
        }
    }
}

/// Group rows by item code, then by (region, store brand).
///
/// Items come out in ascending item-code order; region groups and stores keep
/// the order they were first seen in. Duplicate rows are kept as separate stores.
pub fn consolidate(dataset: &Dataset) -> Result<Vec<ConsolidatedItem>> {
    let mut items: BTreeMap<String, ItemBuilder> = BTreeMap::new();

    for row in dataset.rows()? {
        items
            .entry(row.item_code.clone())
            .or_insert_with(|| ItemBuilder {
                item: ConsolidatedItem::from_first_row(&row),
                group_index: HashMap::new(),
            })
            .push(row);
    }

    debug!(
        rows = dataset.len(),
        items = items.len(),
        "consolidated report"
    );
    Ok(items.into_values().map(|builder| builder.item).collect())
}

/// Distinct regions, sorted.
pub fn regions(dataset: &Dataset) -> Result<Vec<String>> {
    dataset.distinct_text(REGION)
}

/// Region to sorted distinct item codes, optionally for a single region.
pub fn item_codes_by_region(
    dataset: &Dataset,
    region: Option<&str>,
) -> Result<BTreeMap<String, Vec<String>>> {
    let regions = dataset.text_column(REGION)?;
    let codes = dataset.text_column(ITEM_CODE)?;

    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (row_region, code) in regions.into_iter().zip(codes.into_iter()) {
        let (Some(row_region), Some(code)) = (row_region, code) else {
            continue;
        };
        if region.is_some_and(|wanted| wanted != row_region) {
            continue;
        }
        grouped
            .entry(row_region.to_string())
            .or_default()
            .insert(code.to_string());
    }

    Ok(grouped
        .into_iter()
        .map(|(region, codes)| (region, codes.into_iter().collect()))
        .collect())
}

/// Items of one region with the description from their first row there, sorted by code.
pub fn item_listing(dataset: &Dataset, region: &str) -> Result<Vec<ItemListing>> {
    let regions = dataset.text_column(REGION)?;
    let codes = dataset.text_column(ITEM_CODE)?;
    let descriptions = dataset.text_column(DESCRIPTION)?;

    let mut listing: BTreeMap<&str, &str> = BTreeMap::new();
    for ((row_region, code), description) in regions
        .into_iter()
        .zip(codes.into_iter())
        .zip(descriptions.into_iter())
    {
        if row_region != Some(region) {
            continue;
        }
        if let Some(code) = code {
            listing.entry(code).or_insert(description.unwrap_or_default());
        }
    }

    Ok(listing
        .into_iter()
        .map(|(item_code, description)| ItemListing {
            item_code: item_code.to_string(),
            description: description.to_string(),
        })
        .collect())
}

/// Consolidated view of one item, optionally restricted to one region.
pub fn item_details(
    dataset: &Dataset,
    item_code: &str,
    region: Option<&str>,
) -> Result<Option<ConsolidatedItem>> {
    let mut criteria = FilterCriteria::new().item_code(item_code);
    criteria.region = region.map(str::to_string);

    let matching = filter(dataset, &criteria)?;
    if matching.is_empty() {
        return Ok(None);
    }
    Ok(consolidate(&matching)?
        .into_iter()
        .find(|item| item.item_code == item_code))
}
