use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::languages::ModelFamily;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub languages: LanguagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Empty means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Inferred from `model_name` when absent
    #[serde(default)]
    pub family: Option<ModelFamily>,
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_num_beams")]
    pub num_beams: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_concurrent_generations")]
    pub max_concurrent_generations: usize,
    #[serde(default = "default_max_queued_requests")]
    pub max_queued_requests: usize,
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    /// NLLB needs the source language; M2M-style deployments may leave it to the model
    #[serde(default = "default_require_source_lang")]
    pub require_source_lang: bool,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_filter() -> String {
    "nllb_translate_server=info,tower_http=info".to_string()
}

fn default_model_name() -> String {
    "facebook/nllb-200-distilled-600M".to_string()
}

fn default_service_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_max_length() -> usize {
    512
}

fn default_num_beams() -> usize {
    4
}

fn default_max_concurrent_generations() -> usize {
    1
}

fn default_max_queued_requests() -> usize {
    64
}

fn default_max_text_chars() -> usize {
    5000
}

fn default_require_source_lang() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_allowed_origins: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            family: None,
            service_url: default_service_url(),
            device: default_device(),
            max_length: default_max_length(),
            num_beams: default_num_beams(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_generations: default_max_concurrent_generations(),
            max_queued_requests: default_max_queued_requests(),
            max_text_chars: default_max_text_chars(),
        }
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            require_source_lang: default_require_source_lang(),
            aliases: HashMap::new(),
        }
    }
}

impl BackendConfig {
    pub fn model_family(&self) -> ModelFamily {
        self.family
            .unwrap_or_else(|| ModelFamily::from_model_name(&self.model_name))
    }
}

impl Config {
    /// Load a YAML or JSON config file, substituting `${VAR}` from the environment
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = read_text_file(path)?;
        let content = substitute_env_vars(&content);

        let path_lower = path.to_lowercase();
        let config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }

    /// Environment variables win over the file
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT must be a valid number: {}", e))?;
        }
        if let Ok(model_name) = std::env::var("MODEL_NAME") {
            self.backend.model_name = model_name;
        }
        if let Ok(url) = std::env::var("INFERENCE_SERVICE_URL") {
            self.backend.service_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("server.port must be between 1 and 65535");
        }
        if self.limits.max_concurrent_generations == 0 {
            anyhow::bail!("limits.max_concurrent_generations must be at least 1");
        }
        reqwest::Url::parse(&self.backend.service_url).map_err(|e| {
            anyhow::anyhow!(
                "backend.service_url {:?} is not a valid URL: {}",
                self.backend.service_url,
                e
            )
        })?;
        Ok(())
    }
}

/// Replace `${VAR_NAME}` with the variable's value; unknown variables are left as written
fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static pattern");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Decode a text file, honouring a UTF-8 or UTF-16 byte order mark
fn read_text_file(path: &str) -> Result<String> {
    let bytes = fs::read(path)?;
    let encoding = encoding_rs::Encoding::for_bom(&bytes)
        .map(|(encoding, _)| encoding)
        .unwrap_or(encoding_rs::UTF_8);
    let (content, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        anyhow::bail!("Configuration file {} is not valid {}", path, encoding.name());
    }
    Ok(content.into_owned())
}
