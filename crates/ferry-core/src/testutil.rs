//! Test utilities: handwritten mocks for the resolver seams.
//!
//! All mocks share state through `Arc<Mutex<_>>` so a clone handed to the
//! resolver still reports to the copy the test asserts on.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::traits::ResourceFetcher;

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    /// Fail before touching the target.
    Immediate,
    /// Write a few bytes to the target, then fail.
    Partial,
}

/// Mock fetcher that writes a fixed body to the target path.
///
/// URLs registered with [`with_failure`](Self::with_failure) or
/// [`with_partial_failure`](Self::with_partial_failure) fail every time they
/// are fetched.
#[derive(Clone)]
pub struct MockFetcher {
    body: Arc<Vec<u8>>,
    delay: Option<Duration>,
    failures: Arc<Mutex<HashMap<String, (FailureMode, AppError)>>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            body: Arc::new(b"\xff\xd8\xff\xe0mock-image".to_vec()),
            delay: None,
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep this long inside every fetch, to let fetches overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = Arc::new(body.to_vec());
        self
    }

    pub fn with_failure(self, url: &str, error: AppError) -> Self {
        self.register(url, FailureMode::Immediate, error);
        self
    }

    pub fn with_partial_failure(self, url: &str, error: AppError) -> Self {
        self.register(url, FailureMode::Partial, error);
        self
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Every URL fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn register(&self, url: &str, mode: FailureMode, error: AppError) {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), (mode, error));
    }

    fn failure_for(&self, url: &str) -> Option<(FailureMode, AppError)> {
        self.failures
            .lock()
            .unwrap()
            .get(url)
            .map(|(mode, error)| (*mode, replicate(error)))
    }

    async fn write_target(&self, url: &str, target: &Path) -> Result<u64, AppError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.failure_for(url) {
            Some((FailureMode::Immediate, error)) => Err(error),
            Some((FailureMode::Partial, error)) => {
                tokio::fs::write(target, &self.body[..self.body.len() / 2])
                    .await
                    .map_err(|e| AppError::FilesystemError(e.to_string()))?;
                Err(error)
            }
            None => {
                tokio::fs::write(target, self.body.as_slice())
                    .await
                    .map_err(|e| AppError::FilesystemError(e.to_string()))?;
                Ok(self.body.len() as u64)
            }
        }
    }
}

impl ResourceFetcher for MockFetcher {
    async fn fetch_to(&self, url: &str, target: &Path) -> Result<u64, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.write_target(url, target).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// `AppError` is not `Clone` because of the wrapped serde error.
fn replicate(error: &AppError) -> AppError {
    match error {
        AppError::HttpError(msg) => AppError::HttpError(msg.clone()),
        AppError::NetworkError(msg) => AppError::NetworkError(msg.clone()),
        AppError::Timeout(secs) => AppError::Timeout(*secs),
        AppError::FilesystemError(msg) => AppError::FilesystemError(msg.clone()),
        AppError::PreconditionError(msg) => AppError::PreconditionError(msg.clone()),
        AppError::ConfigError(msg) => AppError::ConfigError(msg.clone()),
        other => AppError::Generic(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Records every progress event by name.
#[derive(Clone, Default)]
pub struct MockReporter {
    events: Arc<Mutex<Vec<String>>>,
    failed: Arc<Mutex<Vec<String>>>,
    total_items: Arc<Mutex<Option<usize>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Local names of failed fetches, in report order.
    pub fn failed(&self) -> Vec<String> {
        self.failed.lock().unwrap().clone()
    }

    pub fn total_items(&self) -> Option<usize> {
        *self.total_items.lock().unwrap()
    }
}

impl ProgressReporter for MockReporter {
    fn report(&self, event: ProgressEvent<'_>) {
        let name = match event {
            ProgressEvent::Started { total_items } => {
                *self.total_items.lock().unwrap() = Some(total_items);
                "Started"
            }
            ProgressEvent::FetchDispatched { .. } => "FetchDispatched",
            ProgressEvent::FetchFailed { local_name, .. } => {
                self.failed.lock().unwrap().push(local_name.to_string());
                "FetchFailed"
            }
            ProgressEvent::Finished { .. } => "Finished",
        };
        self.events.lock().unwrap().push(name.to_string());
    }
}
