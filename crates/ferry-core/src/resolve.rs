use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::Instrument;
use uuid::Uuid;

use crate::arena::RecordArena;
use crate::cache::{CacheEntry, CacheLookup, ResourceCache};
use crate::config::ResolverConfig;
use crate::download::fetch_resource;
use crate::enumerate::TaskEnumerator;
use crate::error::AppError;
use crate::models::{FetchOutcome, FetchTask, Record, RunStats};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::rewrite::OutcomeRewriter;
use crate::scheduler;
use crate::traits::{DirectoryResolver, ResourceFetcher};

/// State owned by a single `process` call.
///
/// Dropped when the call returns, so nothing leaks into the next batch.
struct RunContext {
    import_dir: PathBuf,
    cache: ResourceCache,
    fetches: AtomicUsize,
    failures: AtomicUsize,
    on_disk: AtomicUsize,
}

impl RunContext {
    fn new(import_dir: PathBuf) -> Self {
        Self {
            import_dir,
            cache: ResourceCache::new(),
            fetches: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            on_disk: AtomicUsize::new(0),
        }
    }

    fn stats(&self, records: usize, tasks: usize) -> RunStats {
        RunStats {
            records,
            tasks,
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            on_disk: self.on_disk.load(Ordering::Relaxed),
        }
    }
}

/// Resolves remote resource references in a batch of records into local files.
///
/// Generic over the fetcher, the directory source and the progress sink, so
/// tests can run the whole pipeline without network access.
pub struct ResourceResolver<F, D, R>
where
    F: ResourceFetcher,
    D: DirectoryResolver,
    R: ProgressReporter,
{
    fetcher: F,
    directory: D,
    reporter: R,
    config: ResolverConfig,
}

impl<F, D, R> ResourceResolver<F, D, R>
where
    F: ResourceFetcher,
    D: DirectoryResolver,
    R: ProgressReporter,
{
    pub fn new(fetcher: F, directory: D, reporter: R, config: ResolverConfig) -> Self {
        Self {
            fetcher,
            directory,
            reporter,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Number of fetches allowed in flight at once.
    pub fn concurrency_limit(&self) -> usize {
        self.config.concurrency_limit
    }

    pub fn set_concurrency_limit(&mut self, limit: usize) {
        self.config.concurrency_limit = limit;
    }

    pub fn overwrite_existing(&self) -> bool {
        self.config.overwrite_existing
    }

    pub fn set_overwrite_existing(&mut self, overwrite: bool) {
        self.config.overwrite_existing = overwrite;
    }

    /// Resolve every configured resource field of `records` in place.
    ///
    /// 1. Ensure the import directory exists (fatal on failure)
    /// 2. Enumerate fetch tasks lazily, record by record
    /// 3. Fetch with bounded concurrency, one fetch per local name
    /// 4. Rewrite fields as outcomes land, then join list fields
    ///
    /// Individual fetch failures never abort the batch: the affected fields
    /// are cleared and a warning is reported.
    pub async fn process(&self, records: &mut Vec<Record>) -> Result<RunStats, AppError> {
        self.config.validate()?;
        let import_dir = self.prepare_import_dir().await?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("process", %run_id);

        async {
            self.reporter.report(ProgressEvent::Started {
                total_items: records.len(),
            });

            let ctx = RunContext::new(import_dir);
            let arena = RecordArena::new(std::mem::take(records));
            let config = &self.config;

            let tasks = TaskEnumerator::new(
                &arena,
                &config.scalar_fields,
                &config.list_fields,
                config.delimiter,
                &ctx.import_dir,
            );
            let rewriter = OutcomeRewriter::new(&arena, &config.list_fields, config.delimiter);

            let completed = scheduler::run(
                tasks,
                config.concurrency_limit,
                |task| self.resolve_task(&ctx, task),
                |task, outcome| rewriter.apply(task, outcome),
            )
            .await;

            rewriter.join_lists();
            *records = arena.into_records();

            let stats = ctx.stats(records.len(), completed);
            self.reporter.report(ProgressEvent::Finished { stats: &stats });
            Ok(stats)
        }
        .instrument(span)
        .await
    }

    async fn prepare_import_dir(&self) -> Result<PathBuf, AppError> {
        let import_dir = self.directory.base_path()?.join(&self.config.import_subdir);
        tokio::fs::create_dir_all(&import_dir).await.map_err(|e| {
            AppError::PreconditionError(format!(
                "cannot create import directory {}: {e}",
                import_dir.display()
            ))
        })?;
        Ok(import_dir)
    }

    async fn resolve_task(&self, ctx: &RunContext, task: FetchTask) -> (FetchTask, FetchOutcome) {
        let outcome = match ctx.cache.lookup_or_create(&task) {
            CacheLookup::OnDisk => {
                ctx.on_disk.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(local_name = %task.local_name, "Already on disk");
                FetchOutcome::Resolved(task.local_name.clone())
            }
            CacheLookup::Attached(entry) | CacheLookup::Created(entry) => {
                entry
                    .outcome_or_fetch(|| self.fetch_entry(ctx, &entry))
                    .await
            }
        };
        (task, outcome)
    }

    async fn fetch_entry(&self, ctx: &RunContext, entry: &CacheEntry) -> FetchOutcome {
        ctx.fetches.fetch_add(1, Ordering::Relaxed);
        self.reporter.report(ProgressEvent::FetchDispatched {
            local_name: entry.local_name(),
            url: entry.source_url(),
        });

        let outcome = fetch_resource(
            &self.fetcher,
            entry.source_url(),
            entry.target_path(),
            entry.local_name(),
        )
        .await;

        if let FetchOutcome::Failed(failure) = &outcome {
            ctx.failures.fetch_add(1, Ordering::Relaxed);
            self.reporter.report(ProgressEvent::FetchFailed {
                local_name: entry.local_name(),
                failure,
            });
        }
        outcome
    }
}
