use std::{collections::HashMap, fs, path::Path, time::Duration};

use engagement_client::ClientConfig;
use tracing::warn;

use crate::views::FileResetPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub api_base_url: String,
    pub request_timeout: Option<Duration>,
    pub upload_reset_policy: FileResetPolicy,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".into(),
            api_base_url: "http://localhost:8000".into(),
            request_timeout: None,
            upload_reset_policy: FileResetPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

pub fn load_settings(config_path: &Path) -> Settings {
    let file = fs::read_to_string(config_path).ok();
    resolve_settings(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file, then the environment.
pub fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(error) => warn!(%error, "ignoring unreadable dashboard config file"),
        }
    }

    if let Some(v) = env("DASHBOARD_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("ENGAGEMENT_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(secs) = v.parse::<u64>() {
            settings.request_timeout = timeout_from_secs(secs);
        }
    }

    if let Some(v) = env("APP__UPLOAD_RESET_POLICY") {
        match v.parse() {
            Ok(policy) => settings.upload_reset_policy = policy,
            Err(error) => warn!(%error, "ignoring APP__UPLOAD_RESET_POLICY"),
        }
    }

    if let Some(v) = env("APP__MAX_UPLOAD_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_upload_bytes = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.bind_addr = v.to_string();
    }
    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(secs) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.request_timeout = timeout_from_secs(secs);
    }
    if let Some(v) = file_cfg
        .get("upload_reset_policy")
        .and_then(toml::Value::as_str)
    {
        match v.parse() {
            Ok(policy) => settings.upload_reset_policy = policy,
            Err(error) => warn!(%error, "ignoring upload_reset_policy from config file"),
        }
    }
    if let Some(v) = file_cfg
        .get("max_upload_bytes")
        .and_then(toml::Value::as_integer)
        .and_then(|v| usize::try_from(v).ok())
    {
        settings.max_upload_bytes = v;
    }
}

/// Zero means no timeout.
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
