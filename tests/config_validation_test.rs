//! Configuration loading and validation tests

use secrecy::ExposeSecret;
use std::path::PathBuf;
use vsa_exporter::collectors::CommonLabel;
use vsa_exporter::config::{parse_flag, Config, MetricsConfig, ServerConfig, VsaConfig};

fn valid_config() -> Config {
    Config {
        vsa: VsaConfig {
            url: "https://vsa.local".to_string(),
            user: "admin".to_string(),
            password: "secret".to_string().into(),
            ignore_certs: false,
            request_timeout_seconds: 30,
            login_path: "api/v1/login".to_string(),
        },
        server: ServerConfig::default(),
        metrics: MetricsConfig::default(),
    }
}

fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "vsa-exporter-{}-{}.toml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_defaults() {
    let server = ServerConfig::default();
    assert_eq!(server.addr, "0.0.0.0");
    assert_eq!(server.port, 9192);

    let metrics = MetricsConfig::default();
    assert_eq!(metrics.poll_interval_seconds, 10);
    assert_eq!(metrics.collector_timeout_seconds, 30);
    assert_eq!(metrics.common_labels, vec!["node_name".to_string()]);
}

#[test]
fn test_valid_config_passes() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_missing_url_is_rejected() {
    let mut config = valid_config();
    config.vsa.url = String::new();

    let err = config.validate().unwrap_err();

    assert!(err.to_string().contains("VSA URL is not set"));
}

#[test]
fn test_url_without_scheme_is_rejected() {
    let mut config = valid_config();
    config.vsa.url = "vsa.local".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_zero_interval_is_rejected() {
    let mut config = valid_config();
    config.metrics.poll_interval_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.metrics.collector_timeout_seconds = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_common_labels() {
    let config = valid_config();
    let labels = config.common_labels().unwrap();
    assert_eq!(
        labels.iter().copied().collect::<Vec<_>>(),
        vec![CommonLabel::NodeName]
    );

    let mut config = valid_config();
    config.metrics.common_labels = vec!["datacenter".to_string()];
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.metrics.common_labels = vec![];
    assert!(config.common_labels().is_err());

    let mut config = valid_config();
    config.metrics.common_labels = vec!["node_name".to_string(), "node_name".to_string()];
    assert!(config.common_labels().is_err());
}

#[test]
fn test_parse_flag() {
    for truthy in ["1", "true", "TRUE", "yes", "on", " 1 "] {
        assert_eq!(parse_flag(truthy), Ok(true), "{}", truthy);
    }
    for falsy in ["0", "false", "no", "off", ""] {
        assert_eq!(parse_flag(falsy), Ok(false), "{}", falsy);
    }
    assert!(parse_flag("maybe").is_err());
}

#[test]
fn test_load_from_file() {
    // Given: A minimal file that only sets the VSA section
    let path = write_temp_config(
        "minimal",
        r#"
[vsa]
url = "https://10.0.0.5"
user = "monitor"
password = "pw"
ignore_certs = true

[metrics]
poll_interval_seconds = 5
"#,
    );

    // When: Loading it
    let config = Config::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    // Then: Given values are used, the rest falls back to defaults
    assert_eq!(config.vsa.url, "https://10.0.0.5");
    assert_eq!(config.vsa.user, "monitor");
    assert_eq!(config.vsa.password.expose_secret(), "pw");
    assert!(config.vsa.ignore_certs);
    assert_eq!(config.vsa.login_path, "api/v1/login");
    assert_eq!(config.vsa.request_timeout_seconds, 30);
    assert_eq!(config.metrics.poll_interval_seconds, 5);
    assert_eq!(config.metrics.collector_timeout_seconds, 30);
    assert_eq!(config.server.port, 9192);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_without_file_needs_url() {
    // Given: A path that does not exist
    let path = std::env::temp_dir().join("vsa-exporter-does-not-exist.toml");

    // When: Loading
    let config = Config::load(path.to_str().unwrap()).unwrap();

    // Then: Loading succeeds but validation asks for a URL
    assert!(config.validate().is_err());
}
