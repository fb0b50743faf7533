//! Per-run deduplication of resource fetches.
//!
//! # Entry states
//!
//! ```text
//! PENDING --[first task starts the fetch]--> IN_FLIGHT --> RESOLVED | FAILED
//! ```
//!
//! Every task whose local name maps to an existing entry attaches to it and
//! observes the same terminal outcome; only one fetch ever runs per entry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OnceCell;

use crate::models::{FetchOutcome, FetchTask};

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Registered, fetch not started yet.
    Pending,
    /// Fetch running.
    InFlight,
    Resolved,
    Failed,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Pending => write!(f, "pending"),
            CacheState::InFlight => write!(f, "in-flight"),
            CacheState::Resolved => write!(f, "resolved"),
            CacheState::Failed => write!(f, "failed"),
        }
    }
}

/// The single fetch registered for one local name.
#[derive(Debug)]
pub struct CacheEntry {
    local_name: String,
    source_url: String,
    target_path: PathBuf,
    started: AtomicBool,
    outcome: OnceCell<FetchOutcome>,
}

impl CacheEntry {
    fn pending(task: &FetchTask) -> Self {
        Self {
            local_name: task.local_name.clone(),
            source_url: task.source_url.clone(),
            target_path: task.target_path.clone(),
            started: AtomicBool::new(false),
            outcome: OnceCell::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// URL of the task that registered the entry; the one actually fetched.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn target_path(&self) -> &PathBuf {
        &self.target_path
    }

    pub fn state(&self) -> CacheState {
        match self.outcome.get() {
            Some(FetchOutcome::Resolved(_)) => CacheState::Resolved,
            Some(FetchOutcome::Failed(_)) => CacheState::Failed,
            None if self.started.load(Ordering::Acquire) => CacheState::InFlight,
            None => CacheState::Pending,
        }
    }

    /// Returns the terminal outcome, running `fetch` if nobody has yet.
    ///
    /// Concurrent callers wait for the first caller's fetch instead of
    /// starting their own.
    pub async fn outcome_or_fetch<F, Fut>(&self, fetch: F) -> FetchOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        self.outcome
            .get_or_init(|| {
                self.started.store(true, Ordering::Release);
                fetch()
            })
            .await
            .clone()
    }
}

/// Result of [`ResourceCache::lookup_or_create`].
#[derive(Debug, Clone)]
pub enum CacheLookup {
    /// An entry already existed; attach to its outcome.
    Attached(Arc<CacheEntry>),
    /// A new pending entry was registered by this call.
    Created(Arc<CacheEntry>),
    /// No entry exists and the target is already on disk.
    OnDisk,
}

impl CacheLookup {
    pub fn entry(&self) -> Option<&Arc<CacheEntry>> {
        match self {
            CacheLookup::Attached(entry) | CacheLookup::Created(entry) => Some(entry),
            CacheLookup::OnDisk => None,
        }
    }
}

/// Map from local name to the fetch that produces it, scoped to one run.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: Mutex<HashMap<String, Arc<CacheEntry>>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Arc<CacheEntry>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned cache mutex");
            poisoned.into_inner()
        })
    }

    /// Atomically find or register the entry for `task.local_name`.
    ///
    /// An existing entry always wins, whatever its state, so a partially
    /// written target of an in-flight fetch is never mistaken for a finished
    /// file. Without an entry, a file already at the target path
    /// short-circuits to [`CacheLookup::OnDisk`].
    pub fn lookup_or_create(&self, task: &FetchTask) -> CacheLookup {
        let mut entries = self.lock_entries();

        if let Some(entry) = entries.get(&task.local_name) {
            return CacheLookup::Attached(Arc::clone(entry));
        }

        if task.target_path.exists() {
            return CacheLookup::OnDisk;
        }

        let entry = Arc::new(CacheEntry::pending(task));
        entries.insert(task.local_name.clone(), Arc::clone(&entry));
        CacheLookup::Created(entry)
    }

    pub fn get(&self, local_name: &str) -> Option<Arc<CacheEntry>> {
        self.lock_entries().get(local_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}
