use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Location used for the audit board route overlay, e.g. `/county/board/0`.
    pub board_route: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8888/api".into(),
            refresh_interval_secs: 5,
            request_timeout_secs: 30,
            board_route: None,
        }
    }
}

impl ClientSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE))
}

/// Defaults, then the optional settings file, then environment variables.
pub fn load_settings_from(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("RLA_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Ok(v) = std::env::var("APP__REFRESH_INTERVAL_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.refresh_interval_secs = parsed;
        }
    }

    if let Ok(v) = std::env::var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Ok(v) = std::env::var("APP__BOARD_ROUTE") {
        settings.board_route = Some(v);
    }

    settings
}

fn apply_file(settings: &mut ClientSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        tracing::warn!("config: ignoring unparseable settings file");
        return;
    };

    if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
        settings.server_url = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("refresh_interval_secs")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.refresh_interval_secs = v;
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.get("board_route").and_then(toml::Value::as_str) {
        settings.board_route = Some(v.to_string());
    }
}
