//! Data ingestion layer for Fruitpal.
//!
//! Parses trade data files in either the structured JSON or the flat line
//! format and aggregates them into commodity/country snapshots.

pub mod aggregator;
pub mod reader;

pub use fruitpal_core as core;
