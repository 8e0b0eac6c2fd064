use std::sync::Arc;
use tracing::{debug, error, info};

use super::interface::{TranslateRequest, TranslateResponse};
use crate::backend::TranslationBackend;
use crate::config::Config;
use crate::error::TranslationError;
use crate::languages::LanguageCodeTable;

/// Request rules that depend on the deployment
#[derive(Debug, Clone, Copy)]
pub struct RequestPolicy {
    pub require_source_lang: bool,
    pub max_text_chars: usize,
}

impl RequestPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            require_source_lang: config.languages.require_source_lang,
            max_text_chars: config.limits.max_text_chars,
        }
    }
}

/// Validates a request, resolves its language codes and runs it through the backend
pub struct Translator {
    languages: Arc<LanguageCodeTable>,
    backend: Arc<dyn TranslationBackend>,
    policy: RequestPolicy,
}

/// A request that passed validation
struct Validated<'a> {
    text: &'a str,
    source_lang: Option<&'a str>,
    target_lang: &'a str,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Translator {
    pub fn new(
        languages: Arc<LanguageCodeTable>,
        backend: Arc<dyn TranslationBackend>,
        policy: RequestPolicy,
    ) -> Self {
        Self {
            languages,
            backend,
            policy,
        }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    fn validate<'a>(&self, request: &'a TranslateRequest) -> Result<Validated<'a>, TranslationError> {
        let text = non_empty(&request.text).ok_or(TranslationError::MissingText)?;

        let source_lang = non_empty(&request.source_lang);
        if source_lang.is_none() && self.policy.require_source_lang {
            return Err(TranslationError::MissingLanguage("source_lang"));
        }
        let target_lang =
            non_empty(&request.target_lang).ok_or(TranslationError::MissingLanguage("target_lang"))?;

        if text.chars().count() > self.policy.max_text_chars {
            return Err(TranslationError::TextTooLong {
                limit: self.policy.max_text_chars,
            });
        }

        Ok(Validated {
            text,
            source_lang,
            target_lang,
        })
    }

    /// Translate one request. The backend is called at most once and never retried.
    pub async fn handle(
        &self,
        request: TranslateRequest,
    ) -> Result<TranslateResponse, TranslationError> {
        let valid = self.validate(&request)?;

        let source_locale = valid.source_lang.map(|code| self.languages.resolve(code));
        let target_locale = self.languages.resolve(valid.target_lang);
        debug!(
            "Resolved {:?} -> {:?}, {} -> {}",
            valid.source_lang, source_locale, valid.target_lang, target_locale
        );

        let translation = self
            .backend
            .generate(valid.text, source_locale, target_locale)
            .await
            .map_err(|e| {
                error!("Backend failed for {:?} -> {}: {}", source_locale, target_locale, e);
                TranslationError::from(e)
            })?;

        info!(
            "Translated {} chars {} -> {}",
            valid.text.chars().count(),
            source_locale.unwrap_or("auto"),
            target_locale
        );

        Ok(TranslateResponse {
            translated_text: translation.clone(),
            translation,
            source_lang: valid.source_lang.map(str::to_string),
            target_lang: valid.target_lang.to_string(),
            original_text: valid.text.to_string(),
        })
    }
}
