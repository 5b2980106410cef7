use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tailorlink_cli::commands::{doctor, migrate, smoke};

#[test]
fn migrate_returns_success_with_in_memory_database() {
    with_env(&[("TAILORLINK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_with_invalid_database_url() {
    with_env(&[("TAILORLINK_DATABASE_URL", "postgres://not-sqlite")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn smoke_returns_success_report_with_valid_env() {
    with_env(&[("TAILORLINK_DATABASE_URL", "sqlite::memory:")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected successful smoke report");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");

        let checks = payload["checks"].as_array().expect("check list");
        let names: Vec<&str> =
            checks.iter().filter_map(|check| check["name"].as_str()).collect();
        assert_eq!(
            names,
            vec![
                "config_validation",
                "classifier_sanity",
                "catalog_coverage",
                "db_connectivity",
                "migration_visibility"
            ]
        );
    });
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[("TAILORLINK_LOGGING_FORMAT", "yaml")], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
    });
}

#[test]
fn doctor_json_reports_all_checks_passing() {
    with_env(&[("TAILORLINK_DATABASE_URL", "sqlite::memory:")], || {
        let output = doctor::run(true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("check list");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().any(|check| check["name"] == "intent_table_readiness"));
    });
}

#[test]
fn doctor_human_output_marks_failures() {
    with_env(&[("TAILORLINK_DATABASE_URL", "postgres://not-sqlite")], || {
        let output = doctor::run(false);
        assert!(output.contains("one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation"));
        assert!(output.contains("- [skip] database_connectivity"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TAILORLINK_DATABASE_URL",
        "TAILORLINK_DATABASE_MAX_CONNECTIONS",
        "TAILORLINK_DATABASE_TIMEOUT_SECS",
        "TAILORLINK_BACKEND_BASE_URL",
        "TAILORLINK_BACKEND_TIMEOUT_SECS",
        "TAILORLINK_BACKEND_SEARCH_RADIUS_KM",
        "TAILORLINK_CHAT_TYPING_DELAY_MS",
        "TAILORLINK_CHAT_DEDUP_WINDOW",
        "TAILORLINK_CHAT_HISTORY_DEBOUNCE_MS",
        "TAILORLINK_CHAT_APP_STORE_URL",
        "TAILORLINK_SERVER_BIND_ADDRESS",
        "TAILORLINK_SERVER_PORT",
        "TAILORLINK_SERVER_HEALTH_CHECK_PORT",
        "TAILORLINK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "TAILORLINK_LOGGING_LEVEL",
        "TAILORLINK_LOGGING_FORMAT",
        "TAILORLINK_LOG_LEVEL",
        "TAILORLINK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
