use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;

/// Everything `/translate` can answer other than a translation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Invalid request body: {0}")]
    MalformedRequest(String),

    #[error("No text provided for translation")]
    MissingText,

    #[error("{0} is required")]
    MissingLanguage(&'static str),

    #[error("Text exceeds the maximum length of {limit} characters")]
    TextTooLong { limit: usize },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Translation model is still loading")]
    ServiceNotReady,

    #[error("Translation service is busy, try again later")]
    ServiceBusy,

    #[error("Translation failed: {0}")]
    Backend(String),
}

impl TranslationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TranslationError::MalformedRequest(_)
            | TranslationError::MissingText
            | TranslationError::MissingLanguage(_)
            | TranslationError::TextTooLong { .. }
            | TranslationError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            TranslationError::ServiceNotReady | TranslationError::ServiceBusy => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TranslationError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind, sent next to the message
    pub fn code(&self) -> &'static str {
        match self {
            TranslationError::MalformedRequest(_) => "malformed_request",
            TranslationError::MissingText => "missing_text",
            TranslationError::MissingLanguage(_) => "missing_language",
            TranslationError::TextTooLong { .. } => "text_too_long",
            TranslationError::UnsupportedLanguage(_) => "unsupported_language",
            TranslationError::ServiceNotReady => "service_not_ready",
            TranslationError::ServiceBusy => "service_busy",
            TranslationError::Backend(_) => "backend_error",
        }
    }
}

impl From<BackendError> for TranslationError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UnsupportedLanguage(message) => {
                TranslationError::UnsupportedLanguage(message)
            }
            BackendError::Busy => TranslationError::ServiceBusy,
            BackendError::Generation(message) | BackendError::Unavailable(message) => {
                TranslationError::Backend(message)
            }
        }
    }
}

impl IntoResponse for TranslationError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        (self.status_code(), body).into_response()
    }
}
