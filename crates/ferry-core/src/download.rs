use std::io::ErrorKind;
use std::path::Path;

use crate::models::{FetchFailure, FetchOutcome};
use crate::traits::ResourceFetcher;

/// Fetch one resource into `target` and turn the result into an outcome.
///
/// On any failure the target file is removed so a later run cannot mistake
/// a partial download for a finished one.
pub async fn fetch_resource<F: ResourceFetcher>(
    fetcher: &F,
    source_url: &str,
    target: &Path,
    local_name: &str,
) -> FetchOutcome {
    match fetcher.fetch_to(source_url, target).await {
        Ok(bytes) => {
            tracing::debug!(%local_name, %bytes, "Resource stored");
            FetchOutcome::Resolved(local_name.to_string())
        }
        Err(e) => {
            discard_partial(target).await;
            FetchOutcome::Failed(FetchFailure {
                kind: e.failure_kind(),
                message: e.to_string(),
            })
        }
    }
}

/// Best-effort removal of a partially written target.
async fn discard_partial(target: &Path) {
    match tokio::fs::remove_file(target).await {
        Ok(()) => {
            tracing::debug!(path = %target.display(), "Removed partial download");
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::debug!(path = %target.display(), error = %e, "Failed to remove partial download");
        }
    }
}
