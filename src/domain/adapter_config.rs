use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decrypted configuration of one adapter instance.
///
/// `metadata` is opaque to the core; each adapter deserializes the keys it
/// understands and ignores the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub adapter_id: String,
    #[serde(default, alias = "adapter_metadata")]
    pub metadata: Map<String, Value>,
}

impl AdapterConfig {
    pub fn new(adapter_id: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            metadata,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Deserialize the metadata into an adapter-specific settings struct.
    pub fn parse<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.metadata.clone()))
    }
}

/// Parameters for one vision LLM call: the adapter's completion kwargs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmCallConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Provider-specific options merged verbatim into the request body.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-tool prompt framing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub preamble: String,
    #[serde(default)]
    pub postamble: String,
}
