use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::application::ports::{AdapterConfigError, AdapterConfigProvider};
use crate::domain::AdapterConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches decrypted adapter instances from the platform service.
pub struct PlatformAdapterConfigProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlatformAdapterConfigProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AdapterConfigError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdapterConfigError::RequestFailed(format!("http client build: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl AdapterConfigProvider for PlatformAdapterConfigProvider {
    #[tracing::instrument(skip(self))]
    async fn get_adapter_config(
        &self,
        instance_id: &str,
    ) -> Result<AdapterConfig, AdapterConfigError> {
        let response = self
            .client
            .get(format!("{}/api/v1/platform/adapter_instance", self.base_url))
            .query(&[("adapter_instance_id", instance_id)])
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AdapterConfigError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(AdapterConfigError::NotFound(instance_id.to_string()));
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(AdapterConfigError::RequestFailed(format!(
                    "platform returned {status}: {body}"
                )));
            }
            _ => {}
        }

        response
            .json::<AdapterConfig>()
            .await
            .map_err(|e| AdapterConfigError::Invalid(e.to_string()))
    }
}
