use std::io::Write;
use std::time::Duration;

use agora_client::config::{ClientConfig, ConfigError};
use agora_query::Freshness;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
api_base_url = "https://forum.example.com/api"
request_timeout_ms = 8000

[auth]
token_refresh_margin_secs = 120

[cache]
stale_time_ms = 0
gc_time_ms = 600000
gc_interval_ms = 30000

[pagination]
feed_page_size = 5
users_page_size = 10
reports_page_size = 10
tags_page_size = 6
window_width = 5

[upload]
endpoint = "https://images.example.com/upload"
api_key = "imgbb-key"
max_bytes = 5242880

[membership]
price_usd = 10
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn config_loads_from_file() {
    let file = write_config(CONFIG);
    let config = ClientConfig::from_path(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.api_base_url, "https://forum.example.com/api");
    assert_eq!(config.request_timeout(), Duration::from_secs(8));
    assert_eq!(config.token_refresh_margin(), Duration::from_secs(120));
    assert_eq!(config.gc_interval(), Duration::from_secs(30));
    assert_eq!(config.upload.api_key.as_deref(), Some("imgbb-key"));
    assert_eq!(config.cache_config().default_freshness, Freshness::Consistent);
}

#[test]
fn config_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ClientConfig::from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn config_missing_section_fails_to_parse() {
    let truncated = CONFIG.replace("[membership]\nprice_usd = 10\n", "");
    let file = write_config(&truncated);
    assert!(matches!(
        ClientConfig::from_path(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn config_rejects_narrow_page_window() {
    let file = write_config(&CONFIG.replace("window_width = 5", "window_width = 1"));
    let config = ClientConfig::from_path(file.path()).unwrap();
    match config.validate() {
        Err(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "pagination.window_width")
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}

#[test]
fn config_rejects_zero_price() {
    let file = write_config(&CONFIG.replace("price_usd = 10", "price_usd = 0"));
    let config = ClientConfig::from_path(file.path()).unwrap();
    assert!(config.validate().is_err());
}
