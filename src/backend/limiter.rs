use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::interface::{BackendError, TranslationBackend};

/// Bounds how many generations run at once and how many requests may wait for one.
///
/// With one permit every call to the inner backend is serialized, which single-device
/// model runtimes need. Requests beyond the wait limit are rejected with
/// [`BackendError::Busy`] instead of piling up in memory.
pub struct ConcurrencyLimitedBackend {
    inner: Arc<dyn TranslationBackend>,
    permits: Semaphore,
    waiting: AtomicUsize,
    max_waiting: usize,
}

/// Leaves the wait queue on drop, including when the caller goes away mid-wait
struct WaitSlot<'a>(&'a AtomicUsize);

impl Drop for WaitSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConcurrencyLimitedBackend {
    pub fn new(
        inner: Arc<dyn TranslationBackend>,
        max_concurrent: usize,
        max_waiting: usize,
    ) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_concurrent.max(1)),
            waiting: AtomicUsize::new(0),
            max_waiting,
        }
    }

    /// Requests currently queued for a permit
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    fn enter_queue(&self) -> Result<WaitSlot<'_>, BackendError> {
        let previous = self.waiting.fetch_add(1, Ordering::SeqCst);
        let slot = WaitSlot(&self.waiting);
        if previous >= self.max_waiting && self.permits.available_permits() == 0 {
            warn!("Generation queue full ({} waiting)", previous);
            return Err(BackendError::Busy);
        }
        Ok(slot)
    }
}

#[async_trait]
impl TranslationBackend for ConcurrencyLimitedBackend {
    async fn generate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
    ) -> Result<String, BackendError> {
        let slot = self.enter_queue()?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        drop(slot);

        debug!("Generation permit acquired, {} still waiting", self.waiting());
        self.inner.generate(text, source_locale, target_locale).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
