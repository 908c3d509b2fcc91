//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Default configuration generation
//! - Partial configuration files fall back to defaults per key
//! - Invalid YAML is reported with the file path
//! - Configured settings flow into the OCR backend

use camino::Utf8PathBuf;
use ocrdrop::ConfigManager;
use ocrdrop::models::{DEFAULT_OCR_PROMPT, UserConfig};
use ocrdrop::services::CommandOcrBackend;
use ocrdrop::JobPath;
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn no_env() -> config::Environment {
    ConfigManager::environment().source(Some(config::Map::new()))
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.user_config_path(), config_path.join("OcrDrop Config.yaml").as_path());
}

#[test]
fn test_creates_missing_config_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("OcrDrop Data");

    ConfigManager::new(&nested).unwrap();

    assert!(nested.exists());
}

#[test]
fn test_load_default_user_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let user_config = manager.load_with_environment(no_env()).unwrap();

    assert_eq!(user_config.ocr.program, "llm");
    assert_eq!(user_config.ocr.model, "gemini-2.0-flash");
    assert_eq!(user_config.ocr.prompt, DEFAULT_OCR_PROMPT);
    assert_eq!(user_config.ocr.timeout_secs, 300);
    assert_eq!(user_config.export.extension, "md");
    assert_eq!(user_config.logging.dir, "logs");
    assert!(!user_config.logging.debug);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.user_config_path(),
        "ocr:\n  model: gemini-2.5-flash\n  timeout_secs: 60\nlogging:\n  json: true\n",
    )
    .unwrap();

    let user_config = manager.load_with_environment(no_env()).unwrap();

    assert_eq!(user_config.ocr.model, "gemini-2.5-flash");
    assert_eq!(user_config.ocr.timeout_secs, 60);
    assert_eq!(user_config.ocr.program, "llm");
    assert!(user_config.logging.json);
    assert_eq!(user_config.export.extension, "md");
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.user_config_path(), "ocr: [unclosed").unwrap();

    let err = manager.load_with_environment(no_env()).unwrap_err();
    assert!(format!("{:#}", err).contains("OcrDrop Config.yaml"));
}

#[test]
fn test_saved_settings_reach_backend_arguments() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = UserConfig::default();
    config.ocr.program = "tesseract".to_string();
    config.ocr.args = vec!["{path}".to_string(), "stdout".to_string()];
    manager.save_user_config(&config).unwrap();

    let loaded = manager.load_with_environment(no_env()).unwrap();
    let backend = CommandOcrBackend::new(loaded.ocr);
    let args = CommandOcrBackend::build_args(backend.settings(), &JobPath::from("scan.png"));

    assert_eq!(backend.settings().program, "tesseract");
    assert_eq!(args, vec!["scan.png", "stdout"]);
}
