use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::interface::{BackendError, TranslationBackend};
use crate::config::BackendConfig;

/// Client for the model runtime that hosts the pretrained seq2seq model.
/// Tokenization and beam search happen on the other side of this client.
#[derive(Debug, Clone)]
pub struct InferenceServiceClient {
    client: Client,
    base_url: String,
    model_name: String,
    device: String,
    max_length: usize,
    num_beams: usize,
}

#[derive(Debug, Serialize)]
struct LoadModelRequest<'a> {
    model_name: &'a str,
    device: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoadModelResponse {
    loaded: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model_name: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    src_lang: Option<&'a str>,
    tgt_lang: &'a str,
    max_length: usize,
    num_beams: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    generated_text: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "detail")]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl InferenceServiceClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.service_url.trim_end_matches('/').to_string(),
            model_name: config.model_name.clone(),
            device: config.device.clone(),
            max_length: config.max_length,
            num_beams: config.num_beams,
        }
    }

    /// Ask the runtime to load the model. Called once at startup; an error here is fatal.
    pub async fn load(&self) -> Result<()> {
        let url = format!("{}/models/load", self.base_url);
        info!(
            "Loading model {} on {} via {}",
            self.model_name, self.device, url
        );

        let request = LoadModelRequest {
            model_name: &self.model_name,
            device: &self.device,
        };
        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Model runtime refused to load {}: {} {}", self.model_name, status, body);
        }

        let result: LoadModelResponse = response.json().await?;
        if !result.loaded {
            anyhow::bail!(
                "Model {} failed to load: {}",
                self.model_name,
                result.error.unwrap_or_else(|| "Unknown error".to_string())
            );
        }

        info!("Model {} loaded", self.model_name);
        Ok(())
    }
}

#[async_trait]
impl TranslationBackend for InferenceServiceClient {
    async fn generate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/generate", self.base_url);
        let request = GenerateRequest {
            model_name: &self.model_name,
            text,
            src_lang: source_locale,
            tgt_lang: target_locale,
            max_length: self.max_length,
            num_beams: self.num_beams,
        };

        debug!(
            "Sending generate request: src={:?}, tgt={}, chars={}",
            source_locale,
            target_locale,
            text.chars().count()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let result: GenerateResponse = response
                .json()
                .await
                .map_err(|e| BackendError::Generation(format!("invalid response body: {}", e)))?;
            return Ok(result.generated_text);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, target_locale))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn classify_failure(status: StatusCode, body: &str, target_locale: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .unwrap_or_else(|| format!("{} {}", status, body.trim()));

    if status == StatusCode::UNPROCESSABLE_ENTITY
        || parsed.code.as_deref() == Some("unsupported_language")
    {
        debug!("Runtime rejected locale {}: {}", target_locale, message);
        BackendError::UnsupportedLanguage(message)
    } else {
        BackendError::Generation(message)
    }
}
