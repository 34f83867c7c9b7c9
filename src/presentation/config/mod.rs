mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AdapterInstanceSettings, ExtractionSettings, LoggingSettings, PlatformSettings,
    RetrySettings, ServerSettings, Settings, StorageProviderSetting, StorageSettings,
    VisionSettings,
};
