use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a translation backend for a single call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The model does not know the requested locale tag
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The model ran and failed (out of memory, internal error, ...)
    #[error("generation failed: {0}")]
    Generation(String),

    /// The model runtime could not be reached
    #[error("model runtime unavailable: {0}")]
    Unavailable(String),

    /// Too many requests are already waiting for the model
    #[error("too many pending translations")]
    Busy,
}

/// A loaded translation model.
///
/// Implementations receive every per-call setting as an argument and keep no
/// per-request state, so one instance can be shared across request handlers.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `text` into `target_locale`.
    ///
    /// # Arguments
    /// * `text` - Text to translate, as received from the client
    /// * `source_locale` - Resolved source locale tag, if the request named one
    /// * `target_locale` - Resolved target locale tag
    async fn generate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
    ) -> Result<String, BackendError>;

    /// Name of the loaded model, e.g. `facebook/nllb-200-distilled-600M`
    fn model_name(&self) -> &str;
}
