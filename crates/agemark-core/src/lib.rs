//! Core types for agemark.
//!
//! This crate provides the data model shared by the scanner and its front
//! ends: scan configuration, findings, per-directory errors and the fatal
//! scan failure type.

mod config;
mod error;
mod record;

pub use config::{ScanConfig, ScanConfigBuilder, ScanConfigBuilderError, now_millis, parse_min_days};
pub use error::{ScanError, ScanErrorKind, ScanFailed};
pub use record::{Finding, MILLIS_PER_DAY, ScanRecord, age_days};
