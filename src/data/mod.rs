//! Data module - CSV loading, flag normalization, filtering and consolidation

mod consolidate;
mod filter;
mod loader;
mod processor;

pub use consolidate::{
    consolidate, item_codes_by_region, item_details, item_listing, regions, ConsolidatedItem,
    ItemListing, RegionGroup, StoreEntry,
};
pub use filter::{filter, FilterCriteria};
pub use loader::{
    load, DataLoader, DataSource, Dataset, Row, DESCRIPTION, END_DATE, ITEM_CODE, LANGUAGE,
    PRICE, REGION, REQUIRED_COLUMNS, SPM_CODE, START_DATE, STORE_BRAND, STORE_CODE, STORE_NAME,
    UNIT_SIZE,
};
pub(crate) use loader::parse_csv;
pub use processor::{
    detect_flag_columns, normalize_flags, normalize_known_flags, KNOWN_FLAG_COLUMNS,
    PB_AVAILABLE, PRODUCT_NON_HALAL, REUSED_SPM, STORE_HALAL,
};
