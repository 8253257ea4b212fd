//! Command Line Module
//! Argument parsing and command dispatch for the promo-report binary.

use crate::data::{
    consolidate, filter, item_codes_by_region, item_details, item_listing, normalize_known_flags,
    regions, Dataset, FilterCriteria, ItemListing,
};
use crate::stats::{SummaryCalculator, DEFAULT_TOP_ITEMS};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for promo-report
#[derive(Parser, Debug)]
#[command(version, about = "Browse promotional item reports")]
pub struct Args {
    /// CSV report to read, or `-` for standard input
    pub path: PathBuf,

    /// Filter option as key=value, repeatable (region, storeCode, itemCode,
    /// storeHalal, pbAvailable, reusedSpm, productNonHalal, flag:<Column>)
    #[arg(long = "filter", short = 'f', value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Filter options as a JSON object, e.g. '{"region": "Region1"}'
    #[arg(long = "filter-json", value_name = "JSON", conflicts_with = "filters")]
    pub filter_json: Option<String>,

    /// Keep Yes/No flag columns as text
    #[arg(long = "no-normalize", action)]
    pub no_normalize: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the filtered rows
    Rows,
    /// List the distinct regions
    Regions,
    /// List item codes with their descriptions, per region
    Items {
        #[arg(long)]
        region: Option<String>,
    },
    /// Show one item with its stores grouped by region and store brand
    Details {
        item_code: String,
        #[arg(long)]
        region: Option<String>,
    },
    /// Consolidate every item
    Consolidate,
    /// Row counts by region and store brand, and the most frequent items
    Summary {
        #[arg(long, default_value_t = DEFAULT_TOP_ITEMS)]
        top: usize,
    },
}

impl Args {
    pub fn reads_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    pub fn criteria(&self) -> crate::Result<FilterCriteria> {
        match &self.filter_json {
            Some(json) => FilterCriteria::from_json(json),
            None => FilterCriteria::from_pairs(&self.filters),
        }
    }
}

/// Normalize, filter and run the requested command against a loaded report.
pub fn run(args: &Args, dataset: &Dataset) -> anyhow::Result<Value> {
    let dataset = if args.no_normalize {
        dataset.clone()
    } else {
        normalize_known_flags(dataset).context("normalizing flag columns")?
    };

    let criteria = args.criteria()?;
    let view = filter(&dataset, &criteria)?;
    info!(rows = view.len(), command = ?args.command, "running command");

    let output = match &args.command {
        Command::Rows => serde_json::to_value(view.rows()?)?,
        Command::Regions => serde_json::to_value(regions(&view)?)?,
        Command::Items { region } => {
            let mut listing: BTreeMap<String, Vec<ItemListing>> = BTreeMap::new();
            for region in item_codes_by_region(&view, region.as_deref())?.into_keys() {
                let items = item_listing(&view, &region)?;
                listing.insert(region, items);
            }
            serde_json::to_value(listing)?
        }
        Command::Details { item_code, region } => {
            let item = item_details(&view, item_code, region.as_deref())?
                .ok_or_else(|| anyhow!("no rows for item '{}'", item_code))?;
            serde_json::to_value(item)?
        }
        Command::Consolidate => serde_json::to_value(consolidate(&view)?)?,
        Command::Summary { top } => {
            serde_json::to_value(SummaryCalculator::summarize(&view, *top)?)?
        }
    };

    Ok(output)
}
