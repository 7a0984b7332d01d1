//! Scan configuration types.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use chrono::Utc;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for one scan invocation.
///
/// A config is immutable for the duration of a scan. In particular `now_millis`
/// is captured once, so every age computed during the run is relative to the
/// same instant.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Minimum age in days for a directory to be reported (<= 0 reports everything).
    #[builder(default = "0")]
    #[serde(default)]
    pub min_days: i64,

    /// Scan-start timestamp in milliseconds since the Unix epoch.
    #[builder(default = "now_millis()")]
    #[serde(default = "now_millis")]
    pub now_millis: i64,

    /// Number of worker threads (0 = one per available processing unit).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Treat symbolic links to directories as directories (no cycle detection).
    #[builder(default = "true")]
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,
}

fn default_follow_symlinks() -> bool {
    true
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config that reports every directory under `root`, aged from now.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            min_days: 0,
            now_millis: now_millis(),
            threads: 0,
            follow_symlinks: true,
        }
    }

    /// Whether a directory of the given age meets the threshold.
    pub fn is_old_enough(&self, age_days: i64) -> bool {
        self.min_days <= 0 || age_days >= self.min_days
    }

    /// Resolve the worker pool size, substituting the machine's parallelism for 0.
    pub fn worker_threads(&self) -> usize {
        match self.threads {
            0 => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            n => n,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Parse a user-supplied minimum age.
///
/// Malformed input is not an error: it is logged and replaced by 0, which
/// reports every directory.
pub fn parse_min_days(input: &str) -> i64 {
    let trimmed = input.trim();
    match trimmed.parse::<i64>() {
        Ok(days) => days,
        Err(err) => {
            tracing::warn!(input = trimmed, %err, "invalid minimum age, using 0 days");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .min_days(30i64)
            .threads(4usize)
            .now_millis(1_000i64)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.min_days, 30);
        assert_eq!(config.threads, 4);
        assert_eq!(config.now_millis, 1_000);
        assert!(config.follow_symlinks);
        assert!(ScanConfig::new("/home/user").follow_symlinks);
    }

    #[test]
    fn test_builder_requires_root() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_builder_captures_now() {
        let before = now_millis();
        let config = ScanConfig::builder().root("/tmp").build().unwrap();
        assert!(config.now_millis >= before);
    }

    #[test]
    fn test_threshold() {
        let mut config = ScanConfig::new("/tmp");
        assert!(config.is_old_enough(-3));
        assert!(config.is_old_enough(0));

        config.min_days = 30;
        assert!(config.is_old_enough(30));
        assert!(config.is_old_enough(31));
        assert!(!config.is_old_enough(29));

        config.min_days = -5;
        assert!(config.is_old_enough(-100));
    }

    #[test]
    fn test_worker_threads() {
        let mut config = ScanConfig::new("/tmp");
        assert!(config.worker_threads() >= 1);

        config.threads = 3;
        assert_eq!(config.worker_threads(), 3);
    }

    #[test]
    fn test_parse_min_days() {
        assert_eq!(parse_min_days("30"), 30);
        assert_eq!(parse_min_days("  7 "), 7);
        assert_eq!(parse_min_days("-2"), -2);
        assert_eq!(parse_min_days("thirty"), 0);
        assert_eq!(parse_min_days(""), 0);
        assert_eq!(parse_min_days("1.5"), 0);
    }

    #[test]
    fn test_serde_defaults() {
        let config: ScanConfig = serde_json::from_str(r#"{"root": "/data"}"#).unwrap();
        assert_eq!(config.min_days, 0);
        assert_eq!(config.threads, 0);
        assert!(config.now_millis > 0);
    }
}
