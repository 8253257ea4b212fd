//! Stats module - Summary analytics over a report

mod calculator;

pub use calculator::{CountEntry, ItemFrequency, Summary, SummaryCalculator, DEFAULT_TOP_ITEMS};
