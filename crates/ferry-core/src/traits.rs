use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Retrieves a remote resource into a local file.
pub trait ResourceFetcher: Send + Sync + Clone {
    /// Streams the body of `url` into `target`, returning the bytes written.
    ///
    /// Implementations may leave a partial file behind on error; the caller
    /// is responsible for removing it.
    fn fetch_to(
        &self,
        url: &str,
        target: &Path,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// Supplies the base storage path downloaded resources are placed under.
pub trait DirectoryResolver: Send + Sync {
    fn base_path(&self) -> Result<PathBuf, AppError>;
}

/// A [`DirectoryResolver`] backed by a fixed path.
#[derive(Debug, Clone)]
pub struct StaticDirectory(PathBuf);

impl StaticDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl DirectoryResolver for StaticDirectory {
    fn base_path(&self) -> Result<PathBuf, AppError> {
        Ok(self.0.clone())
    }
}
