use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::infra::mock::DEFAULT_LATENCY;

const APP_DIR: &str = "tickets";
const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_USER_NAME: &str = "Usuario Demo";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub user_name: String,
    pub mock_latency: Duration,
}

/// Where tickets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Mock,
}

impl BackendKind {
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "http" => Ok(BackendKind::Http),
            "mock" => Ok(BackendKind::Mock),
            other => Err(AppError::Configuration(format!(
                "unknown backend '{other}' (expected 'http' or 'mock')"
            ))),
        }
    }
}

/// Mock latency is configured as whole milliseconds.
pub fn parse_latency(ms: &str) -> AppResult<Duration> {
    ms.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| AppError::Configuration(format!("invalid mock latency '{ms}'")))
}

/// Settings saved by `config init`. Unset values fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub backend: Option<String>,
    pub api_base_url: Option<String>,
    pub data_dir: Option<String>,
    pub user_name: Option<String>,
    pub mock_latency_ms: Option<String>,
}

pub fn config_directory() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| AppError::Configuration("no configuration directory available".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

fn default_data_dir() -> AppResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| AppError::Configuration("no data directory available".to_string()))
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }

    /// Environment variables take precedence over stored values.
    pub fn overlay_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (var, target) in [
            ("TICKETS_BACKEND", &mut self.backend),
            ("TICKETS_API_URL", &mut self.api_base_url),
            ("TICKETS_DATA_DIR", &mut self.data_dir),
            ("TICKETS_USER", &mut self.user_name),
            ("TICKETS_MOCK_LATENCY_MS", &mut self.mock_latency_ms),
        ] {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *target = Some(value);
            }
        }
        self
    }
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?.overlay_env(|var| std::env::var(var).ok());
        Self::resolve(stored)
    }

    pub fn resolve(stored: StoredConfig) -> AppResult<Self> {
        let backend = match stored.backend.as_deref() {
            Some(value) => BackendKind::parse(value)?,
            None => BackendKind::Http,
        };
        let data_dir = match stored.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let mock_latency = match stored.mock_latency_ms.as_deref() {
            Some(ms) => parse_latency(ms)?,
            None => DEFAULT_LATENCY,
        };

        Ok(Self {
            backend,
            api_base_url: stored
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            data_dir,
            user_name: stored
                .user_name
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            mock_latency,
        })
    }
}
