use crate::models::{FetchFailure, RunStats};

/// Events emitted while a batch is being resolved.
#[derive(Debug, Clone)]
pub enum ProgressEvent<'a> {
    Started {
        total_items: usize,
    },
    FetchDispatched {
        local_name: &'a str,
        url: &'a str,
    },
    FetchFailed {
        local_name: &'a str,
        failure: &'a FetchFailure,
    },
    Finished {
        stats: &'a RunStats,
    },
}

/// Trait for receiving progress events (decoupled logging).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn report(&self, event: ProgressEvent<'_>) {
        match event {
            ProgressEvent::Started { total_items } => {
                tracing::info!(%total_items, "Downloading resources for {} items", total_items);
            }
            ProgressEvent::FetchDispatched { local_name, url } => {
                tracing::debug!(%local_name, %url, "Fetching resource");
            }
            ProgressEvent::FetchFailed {
                local_name,
                failure,
            } => {
                tracing::warn!(
                    %local_name,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Resource can not be downloaded"
                );
            }
            ProgressEvent::Finished { stats } => {
                tracing::info!(
                    records = stats.records,
                    tasks = stats.tasks,
                    fetches = stats.fetches,
                    failures = stats.failures,
                    on_disk = stats.on_disk,
                    "Resource download finished"
                );
            }
        }
    }
}
