use crate::error::AppError;

pub const DEFAULT_CONCURRENCY: usize = 25;
pub const DEFAULT_IMPORT_SUBDIR: &str = "import";
pub const DEFAULT_SCALAR_FIELDS: &[&str] = &["swatch_image", "image", "small_image", "thumbnail"];
pub const DEFAULT_LIST_FIELDS: &[&str] = &["additional_images"];

/// Configuration for one resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum number of fetches in flight at once.
    pub concurrency_limit: usize,

    /// Re-download resources that already exist on disk.
    ///
    /// Declared for callers but not consulted: a target already on disk is
    /// always reused.
    // TODO: gate the on-disk skip in `ResourceCache::lookup_or_create` on this flag.
    pub overwrite_existing: bool,

    /// Fields holding a single resource URL.
    pub scalar_fields: Vec<String>,

    /// Fields holding a delimited list of resource URLs.
    pub list_fields: Vec<String>,

    pub delimiter: char,

    /// Subdirectory of the resolved base path that receives the files.
    pub import_subdir: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            overwrite_existing: false,
            scalar_fields: DEFAULT_SCALAR_FIELDS.iter().map(|s| s.to_string()).collect(),
            list_fields: DEFAULT_LIST_FIELDS.iter().map(|s| s.to_string()).collect(),
            delimiter: ',',
            import_subdir: DEFAULT_IMPORT_SUBDIR.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Read overrides from environment variables on top of the defaults.
    ///
    /// - `FERRY_CONCURRENCY` (optional, defaults to 25)
    /// - `FERRY_OVERWRITE_EXISTING` (optional, defaults to false)
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("FERRY_CONCURRENCY") {
            config.concurrency_limit = parse_concurrency(&raw)?;
        }

        if let Ok(raw) = std::env::var("FERRY_OVERWRITE_EXISTING") {
            config.overwrite_existing = parse_flag(&raw).ok_or_else(|| {
                AppError::ConfigError(format!(
                    "Invalid FERRY_OVERWRITE_EXISTING '{raw}': expected true/false"
                ))
            })?;
        }

        Ok(config)
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn with_scalar_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scalar_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_list_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_import_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.import_subdir = subdir.into();
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.concurrency_limit == 0 {
            return Err(AppError::ConfigError(
                "concurrency limit must be at least 1".into(),
            ));
        }
        if self.import_subdir.is_empty() {
            return Err(AppError::ConfigError(
                "import subdirectory must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn parse_concurrency(raw: &str) -> Result<usize, AppError> {
    let parsed: usize = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid FERRY_CONCURRENCY '{raw}': must be a positive integer"
        ))
    })?;
    if parsed == 0 {
        return Err(AppError::ConfigError(
            "FERRY_CONCURRENCY must be at least 1".into(),
        ));
    }
    Ok(parsed)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
