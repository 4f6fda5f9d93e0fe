//! Configuration loading tests

use std::io::Write;

use assert_matches::assert_matches;
use idmc_registration::config::Settings;
use idmc_registration::IdmcError;
use serial_test::serial;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create config file");
    file.write_all(contents.as_bytes()).expect("Failed to write config file");
    file
}

#[test]
#[serial]
fn test_file_overrides_defaults() {
    let file = write_config(
        r#"
[database]
url = "postgresql://idmc:secret@db/idmc"
max_connections = 4
min_connections = 1

[event]
year = 2026
payment_deadline_days = 3
search_scan_limit = 300
short_code_attempts = 5
check_in_retries = 5

[features]
stats_cache = true
workshop_waitlist = false
"#,
    );

    let settings = Settings::from_file(file.path()).unwrap();

    assert_eq!(settings.database.url, "postgresql://idmc:secret@db/idmc");
    assert_eq!(settings.database.max_connections, 4);
    assert_eq!(settings.event.payment_deadline_days, 3);
    assert_eq!(settings.event.search_scan_limit, 300);
    assert!(settings.features.stats_cache);
    assert!(!settings.features.workshop_waitlist);
    // untouched sections keep their defaults
    assert_eq!(settings.redis.prefix, "idmc:");
    assert_eq!(settings.logging.level, "info");
    assert!(settings.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let file = write_config(
        r#"
[logging]
level = "debug"
file_path = "logs"
"#,
    );

    std::env::set_var("IDMC__LOGGING__LEVEL", "warn");
    std::env::set_var("IDMC__FUNCTIONS__BASE_URL", "https://functions.example.com/idmc-2026/us-central1");
    let settings = Settings::from_file(file.path());
    std::env::remove_var("IDMC__LOGGING__LEVEL");
    std::env::remove_var("IDMC__FUNCTIONS__BASE_URL");

    let settings = settings.unwrap();
    assert_eq!(settings.logging.level, "warn");
    assert_eq!(settings.functions.base_url, "https://functions.example.com/idmc-2026/us-central1");
}

#[test]
#[serial]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Settings::from_file(&dir.path().join("absent.toml")).is_err());
}

#[test]
#[serial]
fn test_invalid_file_values_fail_validation() {
    let file = write_config(
        r#"
[event]
year = 2026
payment_deadline_days = 7
search_scan_limit = 50
short_code_attempts = 5
check_in_retries = 3
"#,
    );

    let settings = Settings::from_file(file.path()).unwrap();
    assert_matches!(settings.validate(), Err(IdmcError::Config(_)));
}
