//! Domain model for daily reports and time series.
//!
//! Holds the address dimension, the `M/D/YY` date rules, the read-filter
//! compiler, ingestion batches, and the [`store::ReportStore`] trait. CSV,
//! SQLite, and HTTP concerns live in the crates built on top of this one.

pub mod address;
pub mod date;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod report;
pub mod store;

pub use error::{Error, Result};
