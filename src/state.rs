use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::backend::{BackendFactory, TranslationBackend};
use crate::config::Config;
use crate::languages::LanguageCodeTable;
use crate::translate::{RequestPolicy, Translator};

/// Shared application state.
///
/// The service starts `Initializing` with no translator and becomes `Ready` once,
/// when the backend finishes loading. There is no way back.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub languages: Arc<LanguageCodeTable>,
    pub started_at: DateTime<Utc>,
    translator: Arc<OnceCell<Translator>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let languages = Arc::new(LanguageCodeTable::with_aliases(
            config.backend.model_family(),
            &config.languages.aliases,
        ));
        info!(
            "Language table ready: {} short codes for {}",
            languages.mapping().len(),
            languages.family().as_str()
        );

        Self {
            config: Arc::new(config),
            languages,
            started_at: Utc::now(),
            translator: Arc::new(OnceCell::new()),
        }
    }

    /// `None` while the backend is still loading
    pub fn translator(&self) -> Option<&Translator> {
        self.translator.get()
    }

    pub fn is_ready(&self) -> bool {
        self.translator.initialized()
    }

    /// Move to `Ready` with a loaded backend. Errors if already ready.
    pub fn install_backend(&self, backend: Arc<dyn TranslationBackend>) -> anyhow::Result<()> {
        let translator = Translator::new(
            self.languages.clone(),
            backend,
            RequestPolicy::from_config(&self.config),
        );
        self.translator
            .set(translator)
            .map_err(|_| anyhow::anyhow!("Translation backend is already initialized"))?;
        info!("Translation service ready");
        Ok(())
    }

    /// Load the configured backend and install it
    pub async fn initialize_backend(&self) -> anyhow::Result<()> {
        let backend = BackendFactory::create(&self.config).await?;
        self.install_backend(backend)
    }
}
