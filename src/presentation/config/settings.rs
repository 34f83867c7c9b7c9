use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::Environment;
use crate::application::services::{MIN_EXTRACTED_TEXT_LENGTH, RENDER_DPI};
use crate::infrastructure::text_processing::{
    DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, MAX_PAGES_DUE_TO_RAM_USAGE,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    #[serde(default)]
    pub extraction: ExtractionSettings,
    #[serde(default)]
    pub platform: PlatformSettings,
    #[serde(default)]
    pub adapters: HashMap<String, AdapterInstanceSettings>,
}

impl Settings {
    /// `configuration/base.yaml`, then `configuration/<env>.yaml`, then
    /// `APP__SECTION__KEY` environment overrides.
    pub fn load(environment: Environment) -> Result<Self, config::ConfigError> {
        let base_path = std::env::current_dir()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?
            .join("configuration");

        config::Config::builder()
            .add_source(config::File::from(base_path.join("base.yaml")).required(false))
            .add_source(
                config::File::from(base_path.join(format!("{}.yaml", environment.file_stem())))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderSetting {
    Local,
    Azure,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub provider: StorageProviderSetting,
    pub local_path: String,
    /// Root for tool (pipeline) runs; defaults to `local_path`.
    #[serde(default)]
    pub tool_path: Option<String>,
    #[serde(default)]
    pub azure_account: Option<String>,
    #[serde(default)]
    pub azure_access_key: Option<String>,
    #[serde(default)]
    pub azure_container: Option<String>,
    #[serde(default)]
    pub azure_tool_container: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub min_text_length: usize,
    pub whisperer_retry: RetrySettings,
    pub whisperer_poll_interval_secs: u64,
    pub vision: VisionSettings,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            min_text_length: MIN_EXTRACTED_TEXT_LENGTH,
            whisperer_retry: RetrySettings::default(),
            whisperer_poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            vision: VisionSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_secs: DEFAULT_BACKOFF_BASE.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub render_dpi: f32,
    pub max_pages: usize,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            render_dpi: RENDER_DPI,
            max_pages: MAX_PAGES_DUE_TO_RAM_USAGE,
        }
    }
}

/// Where adapter instances are looked up. With a `url` the platform service
/// is queried, otherwise `adapters` is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdapterInstanceSettings {
    pub adapter_id: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}
