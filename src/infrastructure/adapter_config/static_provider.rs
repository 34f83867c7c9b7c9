use std::collections::HashMap;

use async_trait::async_trait;

use crate::application::ports::{AdapterConfigError, AdapterConfigProvider};
use crate::domain::AdapterConfig;
use crate::presentation::config::AdapterInstanceSettings;

/// Adapter instances declared up front, keyed by instance id.
#[derive(Debug, Clone, Default)]
pub struct StaticAdapterConfigProvider {
    instances: HashMap<String, AdapterConfig>,
}

impl StaticAdapterConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(mut self, instance_id: impl Into<String>, config: AdapterConfig) -> Self {
        self.instances.insert(instance_id.into(), config);
        self
    }

    pub fn from_settings(adapters: &HashMap<String, AdapterInstanceSettings>) -> Self {
        let instances = adapters
            .iter()
            .map(|(id, instance)| {
                (
                    id.clone(),
                    AdapterConfig::new(instance.adapter_id.clone(), instance.metadata.clone()),
                )
            })
            .collect();
        Self { instances }
    }
}

#[async_trait]
impl AdapterConfigProvider for StaticAdapterConfigProvider {
    async fn get_adapter_config(
        &self,
        instance_id: &str,
    ) -> Result<AdapterConfig, AdapterConfigError> {
        self.instances
            .get(instance_id)
            .cloned()
            .ok_or_else(|| AdapterConfigError::NotFound(instance_id.to_string()))
    }
}
