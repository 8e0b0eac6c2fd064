//! In-process backend for tests: counts calls and answers from a closure.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use super::interface::{BackendError, TranslationBackend};

type Responder = dyn Fn(&str, Option<&str>, &str) -> Result<String, BackendError> + Send + Sync;

pub struct StubBackend {
    responder: Box<Responder>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<(String, Option<String>, String)>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl StubBackend {
    pub fn new(
        responder: impl Fn(&str, Option<&str>, &str) -> Result<String, BackendError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
        }
    }

    /// Answers `"{target}:{text}"`
    pub fn echo() -> Self {
        Self::new(|text, _source, target| Ok(format!("{}:{}", target, text)))
    }

    pub fn failing(error: BackendError) -> Self {
        Self::new(move |_, _, _| Err(error.clone()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Each call takes one permit from `gate` before answering
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// `(text, source_locale, target_locale)` of every call so far
    pub fn seen(&self) -> Vec<(String, Option<String>, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationBackend for StubBackend {
    async fn generate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((
            text.to_string(),
            source_locale.map(str::to_string),
            target_locale.to_string(),
        ));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(text, source_locale, target_locale)
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
