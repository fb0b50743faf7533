use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Value held by a single record field.
///
/// `List` only appears while a run is in progress: the enumerator splits
/// delimited fields into it, and the resolver joins them back into `Text`
/// once every fetch has landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    List(Vec<Option<String>>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Cleared or empty-string values.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item.as_deref().unwrap_or_default())?;
                }
                Ok(())
            }
        }
    }
}

/// A single data record: field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(field)
    }

    /// Text value of a field, `None` when absent, cleared or still a list.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut FieldValue> {
        self.fields.values_mut()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Address of a field (and list element) inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLocator {
    /// Index of the owning record in the batch.
    pub record: usize,
    pub field: String,
    /// Element index for list fields, `None` for scalar fields.
    pub element: Option<usize>,
}

impl FieldLocator {
    pub fn scalar(record: usize, field: impl Into<String>) -> Self {
        Self {
            record,
            field: field.into(),
            element: None,
        }
    }

    pub fn element(record: usize, field: impl Into<String>, element: usize) -> Self {
        Self {
            record,
            field: field.into(),
            element: Some(element),
        }
    }
}

impl fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element {
            Some(i) => write!(f, "#{}.{}[{}]", self.record, self.field, i),
            None => write!(f, "#{}.{}", self.record, self.field),
        }
    }
}

/// One resource reference to resolve, bound to the field it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub source_url: String,
    /// Deterministic file name derived from `source_url`; also the cache key.
    pub local_name: String,
    pub target_path: PathBuf,
    pub locator: FieldLocator,
}

/// Broad category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Network,
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network"),
            FailureKind::Filesystem => write!(f, "filesystem"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.message)
    }
}

/// Terminal result of resolving one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Resolved(String),
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FetchOutcome::Resolved(_))
    }
}

/// Counters for one `process` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Records in the batch.
    pub records: usize,
    /// Fetch tasks produced by the enumerator.
    pub tasks: usize,
    /// Network fetches actually started.
    pub fetches: usize,
    /// Fetches that ended in failure.
    pub failures: usize,
    /// Tasks satisfied by a file already present on disk.
    pub on_disk: usize,
}
