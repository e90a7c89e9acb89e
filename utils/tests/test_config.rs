use utils::app_config::*;

use std::sync::{Mutex, MutexGuard};

// The configuration store is process-global; serialize the tests that
// reset or mutate it.
static LOCK: Mutex<()> = Mutex::new(());

pub fn initialize() -> MutexGuard<'static, ()> {
    let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());

    // Reset to original test configuration
    let config_contents = include_str!("resources/test_config.toml");
    AppConfig::init(Some(config_contents)).unwrap();

    guard
}

#[test]
fn fetch_config() {
    let _guard = initialize();

    // Fetch an instance of Config
    let config = AppConfig::fetch().unwrap();

    assert_eq!(config.debug, false);

    // Test all log configuration items
    assert_eq!(config.log.level, "info");

    // Test all mirror configuration items
    assert_eq!(config.mirror.interval, 5);
    assert_eq!(config.mirror.checksum, false);
}

#[test]
fn verify_get() {
    let _guard = initialize();

    // Test getting all log configuration items via get
    assert_eq!(AppConfig::get::<String>("log.level").unwrap(), "info");

    // Test getting all mirror configuration items via get
    assert_eq!(AppConfig::get::<u64>("mirror.interval").unwrap(), 5);
    assert_eq!(AppConfig::get::<bool>("mirror.checksum").unwrap(), false);

    assert_eq!(AppConfig::get::<bool>("debug").unwrap(), false);
}

#[test]
fn verify_set() {
    let _guard = initialize();

    // Test setting various configuration items
    AppConfig::set("log.level", "debug").unwrap();
    AppConfig::set("mirror.interval", "30").unwrap();
    AppConfig::set("mirror.checksum", "true").unwrap();

    // Fetch a new instance of Config
    let config = AppConfig::fetch().unwrap();

    // Check all values were modified
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.mirror.interval, 30);
    assert_eq!(config.mirror.checksum, true);
}

#[test]
fn test_config_validation() {
    let _guard = initialize();

    let config = AppConfig::fetch().unwrap();

    assert!(
        config.mirror.interval > 0,
        "Mirror interval should be positive"
    );
    assert!(
        !config.log.level.is_empty(),
        "Log level should not be empty"
    );
}

#[test]
fn test_nested_configuration_access() {
    let _guard = initialize();

    // Test accessing nested configuration structures
    let log_config = AppConfig::get::<LogConfig>("log").unwrap();
    assert_eq!(log_config.level, "info");

    let mirror_config = AppConfig::get::<MirrorConfig>("mirror").unwrap();
    assert_eq!(mirror_config.interval, 5);
    assert_eq!(mirror_config.checksum, false);
}
