use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use parseris::application::ports::{AdapterConfigProvider, ExtractorResolver, FileStorageResolver};
use parseris::application::services::{
    ExtractionPolicy, ExtractionService, VisionPolicy, VisionTableService,
};
use parseris::infrastructure::adapter_config::{
    PlatformAdapterConfigProvider, StaticAdapterConfigProvider,
};
use parseris::infrastructure::llm::OpenAiVisionClient;
use parseris::infrastructure::observability::{TracingConfig, init_tracing};
use parseris::infrastructure::storage::FileStorageFactory;
use parseris::infrastructure::text_processing::{
    AdapterDependencies, AdapterRegistry, PdfiumRasterizer, RetryPolicy,
};
use parseris::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load configuration")?;

    init_tracing(&TracingConfig::from_settings(&settings.logging, environment))
        .context("Failed to initialize tracing")?;

    let adapter_configs: Arc<dyn AdapterConfigProvider> = match (
        settings.platform.url.as_deref(),
        settings.platform.api_key.as_deref(),
    ) {
        (Some(url), Some(api_key)) if !url.trim().is_empty() => {
            tracing::info!(url, "Using platform adapter configuration");
            Arc::new(PlatformAdapterConfigProvider::new(url, api_key)?)
        }
        _ => {
            tracing::info!(
                instances = settings.adapters.len(),
                "Using static adapter configuration"
            );
            Arc::new(StaticAdapterConfigProvider::from_settings(&settings.adapters))
        }
    };

    let extraction = &settings.extraction;
    let rasterizer = Arc::new(PdfiumRasterizer::new(extraction.vision.max_pages));
    let llm = Arc::new(OpenAiVisionClient::new()?);

    let extractors: Arc<dyn ExtractorResolver> = Arc::new(AdapterRegistry::new(
        adapter_configs,
        AdapterDependencies {
            retry: RetryPolicy {
                max_attempts: extraction.whisperer_retry.max_attempts,
                backoff_base: Duration::from_secs(extraction.whisperer_retry.backoff_base_secs),
            },
            poll_interval: Duration::from_secs(extraction.whisperer_poll_interval_secs),
            rasterizer: rasterizer.clone(),
            llm: llm.clone(),
            render_dpi: extraction.vision.render_dpi,
        },
    ));

    let storage: Arc<dyn FileStorageResolver> =
        Arc::new(FileStorageFactory::create(&settings.storage)?);

    let extraction_service = Arc::new(ExtractionService::new(
        Arc::clone(&extractors),
        Arc::clone(&storage),
        ExtractionPolicy {
            min_text_length: extraction.min_text_length,
        },
    ));
    let vision_service = Arc::new(VisionTableService::new(
        rasterizer,
        llm,
        VisionPolicy {
            render_dpi: extraction.vision.render_dpi,
        },
    ));

    let router = create_router(AppState {
        extraction_service,
        vision_service,
        extractors,
        storage,
    });

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!(%addr, %environment, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
