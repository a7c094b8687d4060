use super::*;
use std::io::Write;

#[test]
fn test_defaults() {
    let config = AnalyzerConfig::default();
    assert_eq!(config.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
    assert!(config.extra_builtins.is_empty());
    assert!(!config.strict_undeclared);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = AnalyzerConfig::from_toml_str("extra_builtins = [\"Sheet1\", \"ThisDocument\"]\n").unwrap();
    assert_eq!(config.extra_builtins, vec!["Sheet1", "ThisDocument"]);
    assert_eq!(config.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
}

#[test]
fn test_unknown_key_is_rejected() {
    assert!(AnalyzerConfig::from_toml_str("max_bytes = 10\n").is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_input_bytes = 2048\nstrict_undeclared = true").unwrap();
    let config = AnalyzerConfig::load(file.path()).unwrap();
    assert_eq!(config.max_input_bytes, 2048);
    assert!(config.strict_undeclared);
}

#[test]
fn test_missing_file_reports_path() {
    let err = AnalyzerConfig::load(Path::new("/nonexistent/vbscope.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/vbscope.toml"));
}

#[test]
fn test_env_override() {
    let lookup = |key: &str| (key == MAX_INPUT_ENV).then(|| "512".to_string());
    let config = AnalyzerConfig::default().with_overrides_from(lookup).unwrap();
    assert_eq!(config.max_input_bytes, 512);

    let unset = AnalyzerConfig::default().with_overrides_from(|_| None).unwrap();
    assert_eq!(unset.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
}

#[test]
fn test_bad_env_override_is_an_error() {
    assert!(
        AnalyzerConfig::default()
            .with_overrides_from(|_| Some("lots".to_string()))
            .is_err()
    );
    assert!(
        AnalyzerConfig::default()
            .with_overrides_from(|_| Some("0".to_string()))
            .is_err()
    );
}
