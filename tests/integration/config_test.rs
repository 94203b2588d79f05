//! Configuration loading and monitor construction

use block_race::config::{Config, ConfigError};
use block_race::monitor::Monitor;
use block_race::report::ReportFormat;

#[test]
fn test_example_config_loads() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.contestants.len(), 2);
    assert_eq!(config.race.primary, "Alchemy");
    assert_eq!(config.race.blocks_per_aggregate, 10);
    assert_eq!(config.report.format, ReportFormat::Text);

    let roster = config.roster().unwrap();
    assert_eq!(roster.name(roster.id("Infura").unwrap()), "Infura");
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.toml");
    std::fs::write(
        &path,
        r#"
            [[contestants]]
            name = "Local"
            ws_url = "ws://127.0.0.1:8546"
            http_url = "http://127.0.0.1:8545"

            [race]
            primary = "Local"
        "#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.primary().unwrap().http_url.as_deref(), Some("http://127.0.0.1:8545"));
}

#[test]
fn test_invalid_config_reports_reason() {
    let err = Config::from_toml(
        r#"
            [[contestants]]
            name = "A"
            ws_url = "ws://a"

            [race]
            primary = "A"
        "#,
    )
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::PrimaryWithoutHttpUrl("A".to_string()))
    );
}

#[tokio::test]
async fn test_monitor_from_example_config() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();
    let monitor = Monitor::from_config(&config).unwrap();

    let engine = monitor.engine();
    assert_eq!(engine.roster().len(), 2);
    assert_eq!(engine.pending_blocks(), 0);
    assert_eq!(engine.snapshot().block_count, 0);
}

#[test]
fn test_broken_config_file_does_not_fall_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
            [[contestants]]
            name = "MyNode"
            ws_url = "ws://127.0.0.1:8546"
            http_url = "http://127.0.0.1:8545"

            [[contestants]]
            name = "MyNode"
            ws_url = "ws://127.0.0.1:9546"

            [race]
            primary = "MyNode"
        "#,
    )
    .unwrap();

    let err = Config::load_if_exists(&path).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::DuplicateContestant("MyNode".to_string()))
    );

    assert!(Config::load_if_exists(dir.path().join("missing.toml"))
        .unwrap()
        .is_none());
}
