use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::inference_service::InferenceServiceClient;
use super::interface::TranslationBackend;
use super::limiter::ConcurrencyLimitedBackend;
use crate::config::Config;

/// Factory for creating the translation backend
pub struct BackendFactory;

impl BackendFactory {
    /// Load the configured model and wrap it in the generation limiter.
    ///
    /// Fails if the model runtime cannot load the model; the caller treats that as fatal.
    pub async fn create(config: &Config) -> Result<Arc<dyn TranslationBackend>> {
        info!(
            "Initializing translation backend: {} ({})",
            config.backend.model_name,
            config.backend.model_family().as_str()
        );

        let client = InferenceServiceClient::new(&config.backend);
        client.load().await?;

        Ok(Self::limited(Arc::new(client), config))
    }

    /// Apply `limits` to an already loaded backend
    pub fn limited(
        backend: Arc<dyn TranslationBackend>,
        config: &Config,
    ) -> Arc<dyn TranslationBackend> {
        let limits = &config.limits;
        info!(
            "Generation limits: {} concurrent, {} queued",
            limits.max_concurrent_generations, limits.max_queued_requests
        );
        Arc::new(ConcurrencyLimitedBackend::new(
            backend,
            limits.max_concurrent_generations,
            limits.max_queued_requests,
        ))
    }
}
