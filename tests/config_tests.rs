use std::env;

use serial_test::serial;

use hwbind::config::AppConfig;
use hwbind::errors::LicenseError;

const VARS: &[&str] = &[
    "HWBIND_SERVER_HOST",
    "HWBIND_SERVER_PORT",
    "PORT",
    "HWBIND_DATABASE_TYPE",
    "HWBIND_DATABASE_URL",
    "HWBIND_DATABASE_MAX_CONNECTIONS",
    "HWBIND_LOGGING_ENABLED",
    "HWBIND_LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn loads_defaults_without_environment() {
    clear_env();

    let config = AppConfig::load().expect("defaults should load");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.database.db_type, "sqlite");
    assert!(config.database.url.starts_with("sqlite:"));
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    clear_env();
    env::set_var("HWBIND_SERVER_HOST", "127.0.0.1");
    env::set_var("HWBIND_SERVER_PORT", "8088");
    env::set_var("HWBIND_DATABASE_URL", "sqlite::memory:");
    env::set_var("HWBIND_DATABASE_MAX_CONNECTIONS", "2");
    env::set_var("HWBIND_LOG_LEVEL", "debug");

    let config = AppConfig::load().expect("config should load");

    assert_eq!(config.bind_address(), "127.0.0.1:8088");
    assert_eq!(config.database.url, "sqlite::memory:");
    assert_eq!(config.database.max_connections, 2);
    assert_eq!(config.logging.level, "debug");

    clear_env();
}

#[test]
#[serial]
fn plain_port_variable_is_honoured() {
    clear_env();
    env::set_var("PORT", "4321");

    let config = AppConfig::load().expect("config should load");
    assert_eq!(config.server.port, 4321);

    env::set_var("HWBIND_SERVER_PORT", "5555");
    let config = AppConfig::load().expect("config should load");
    assert_eq!(config.server.port, 5555);

    clear_env();
}

#[test]
#[serial]
fn invalid_environment_is_rejected() {
    clear_env();
    env::set_var("HWBIND_DATABASE_TYPE", "oracle");

    let err = AppConfig::load().unwrap_err();
    assert!(matches!(err, LicenseError::Config(_)));

    clear_env();
}
