use agemark_core::{
    Finding, MILLIS_PER_DAY, ScanConfig, ScanError, ScanErrorKind, ScanFailed, ScanRecord,
    age_days, parse_min_days,
};
use std::path::PathBuf;

#[test]
fn test_config_builder_and_threshold() {
    let config = ScanConfig::builder()
        .root("/srv/share")
        .min_days(parse_min_days("45"))
        .now_millis(90 * MILLIS_PER_DAY)
        .build()
        .unwrap();

    assert_eq!(config.root, PathBuf::from("/srv/share"));
    assert_eq!(config.min_days, 45);

    let created = 40 * MILLIS_PER_DAY;
    let age = age_days(created, config.now_millis);
    assert_eq!(age, 50);
    assert!(config.is_old_enough(age));
    assert!(!config.is_old_enough(age_days(60 * MILLIS_PER_DAY, config.now_millis)));
}

#[test]
fn test_config_builder_error_message() {
    let err = ScanConfig::builder().root("").build().unwrap_err();
    assert!(err.to_string().contains("Root path cannot be empty"));
}

#[test]
fn test_config_json_roundtrip() {
    let config = ScanConfig::builder()
        .root("/data")
        .min_days(7i64)
        .now_millis(1_234i64)
        .threads(2usize)
        .follow_symlinks(false)
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    let parsed: ScanConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.root, config.root);
    assert_eq!(parsed.min_days, 7);
    assert_eq!(parsed.now_millis, 1_234);
    assert_eq!(parsed.threads, 2);
    assert!(!parsed.follow_symlinks);
}

#[test]
fn test_config_json_defaults() {
    let parsed: ScanConfig = serde_json::from_str(r#"{"root": "/data"}"#).unwrap();
    assert_eq!(parsed.min_days, 0);
    assert_eq!(parsed.threads, 0);
    assert!(parsed.follow_symlinks);
}

#[test]
fn test_record_rendering() {
    let records: Vec<ScanRecord> = vec![
        Finding::new("/data/old", 400).into(),
        ScanError::new("/data/locked", "Permission denied", ScanErrorKind::Listing).into(),
        ScanError::new("/data/odd", "unsupported", ScanErrorKind::AttributeRead).into(),
    ];

    let lines: Vec<String> = records.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "Folder: \"/data/old\", days since creation: 400".to_string(),
            "Could not access directory: /data/locked".to_string(),
            "Could not read folder info: /data/odd - unsupported".to_string(),
        ]
    );
}

#[test]
fn test_record_serialization() {
    let record = ScanRecord::from(Finding::new("/data/old", 12));
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["Finding"]["age_days"], 12);

    let parsed: ScanRecord = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, record);
}

#[test]
fn test_scan_failed_variants() {
    let err = ScanFailed::Spawn {
        source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no memory"),
    };
    assert!(err.to_string().starts_with("Could not start scan thread"));
    assert!(std::error::Error::source(&err).is_some());

    let err = ScanFailed::ThreadPool {
        message: "resource exhausted".to_string(),
    };
    assert_eq!(err.to_string(), "Could not start worker pool: resource exhausted");
}
