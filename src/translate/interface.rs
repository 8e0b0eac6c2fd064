use serde::{Deserialize, Serialize};

/// Body of `POST /translate`.
///
/// Fields are optional so a missing field is reported as a validation error
/// rather than a parse error. Both naming variants used by clients are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "source_language")]
    pub source_lang: Option<String>,
    #[serde(default, alias = "target_language")]
    pub target_lang: Option<String>,
}

/// Successful `/translate` answer. `translated_text` mirrors `translation` for
/// clients written against the other response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translation: String,
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
    pub target_lang: String,
    pub original_text: String,
}

#[cfg(test)]
impl TranslateRequest {
    pub fn new(text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            source_lang: Some(source_lang.to_string()),
            target_lang: Some(target_lang.to_string()),
        }
    }
}
