use std::{collections::HashMap, fs, path::Path};

pub const DEFAULT_CONFIG_FILE: &str = "backend.toml";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".into(),
            database_url: "sqlite://./data/engagement.db".into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
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
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
                settings.bind_addr = v.to_string();
            }
            if let Some(v) = file_cfg.get("database_url").and_then(toml::Value::as_str) {
                settings.database_url = v.to_string();
            }
            if let Some(v) = file_cfg
                .get("max_upload_bytes")
                .and_then(toml::Value::as_integer)
                .and_then(|v| usize::try_from(v).ok())
            {
                settings.max_upload_bytes = v;
            }
        }
    }

    if let Some(v) = env("BACKEND_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__MAX_UPLOAD_BYTES") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.max_upload_bytes = parsed;
        }
    }

    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.replace('\\', "/");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
