pub mod arena;
pub mod cache;
pub mod config;
pub mod download;
pub mod enumerate;
pub mod error;
pub mod models;
pub mod progress;
pub mod resolve;
pub mod rewrite;
pub mod scheduler;
pub mod traits;
pub mod util;

#[cfg(test)]
pub mod testutil;

pub use config::ResolverConfig;
pub use error::AppError;
pub use models::{FailureKind, FetchFailure, FetchOutcome, FieldValue, Record, RunStats};
pub use progress::{NullReporter, ProgressEvent, ProgressReporter, TracingProgressReporter};
pub use resolve::ResourceResolver;
pub use traits::{DirectoryResolver, ResourceFetcher, StaticDirectory};
