//! Promo Report - loading, filtering & consolidation of promotional item reports
//!
//! A report is a CSV export with one row per (store, item). The crate loads and
//! validates it into a [`Dataset`], normalizes Yes/No flag columns, filters rows,
//! and folds them into per-item [`ConsolidatedItem`] trees for browsing.

pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod stats;

pub use cache::DatasetCache;
pub use data::{
    consolidate, filter, item_codes_by_region, item_details, item_listing, load,
    normalize_flags, normalize_known_flags, regions, ConsolidatedItem, DataLoader, DataSource,
    Dataset, FilterCriteria, ItemListing, RegionGroup, Row, StoreEntry,
};
pub use error::{ReportError, Result};
pub use stats::{Summary, SummaryCalculator};
