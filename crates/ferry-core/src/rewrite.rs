use crate::arena::RecordArena;
use crate::models::{FetchOutcome, FetchTask, FieldLocator, FieldValue, Record};

/// Writes fetch outcomes back into the records of a batch.
pub struct OutcomeRewriter<'a> {
    arena: &'a RecordArena,
    list_fields: &'a [String],
    delimiter: char,
}

impl<'a> OutcomeRewriter<'a> {
    pub fn new(arena: &'a RecordArena, list_fields: &'a [String], delimiter: char) -> Self {
        Self {
            arena,
            list_fields,
            delimiter,
        }
    }

    /// Apply one task's terminal outcome to its owning record.
    ///
    /// A failure clears the addressed field or element, then every other
    /// value in the same record that still equals the task's source URL.
    pub fn apply(&self, task: &FetchTask, outcome: &FetchOutcome) {
        let Some(mut record) = self.arena.lock(task.locator.record) else {
            tracing::warn!(locator = %task.locator, "Outcome for a record outside the batch");
            return;
        };

        match outcome {
            FetchOutcome::Resolved(local_name) => {
                write_at(&mut record, &task.locator, Some(local_name.clone()));
            }
            FetchOutcome::Failed(_) => {
                write_at(&mut record, &task.locator, None);
                clear_matching(&mut record, &task.source_url);
            }
        }
    }

    /// Join every list field back into its delimited text form.
    ///
    /// Cleared elements become empty segments.
    pub fn join_lists(&self) {
        let separator = self.delimiter.to_string();
        for index in 0..self.arena.len() {
            let Some(mut record) = self.arena.lock(index) else {
                continue;
            };
            for field in self.list_fields {
                if let Some(value) = record.get_mut(field) {
                    if let FieldValue::List(items) = value {
                        let joined = items
                            .iter()
                            .map(|item| item.as_deref().unwrap_or_default())
                            .collect::<Vec<_>>()
                            .join(&separator);
                        *value = FieldValue::Text(joined);
                    }
                }
            }
        }
    }
}

fn write_at(record: &mut Record, locator: &FieldLocator, value: Option<String>) {
    match (record.get_mut(&locator.field), locator.element) {
        (Some(FieldValue::List(items)), Some(i)) => match items.get_mut(i) {
            Some(slot) => *slot = value,
            None => tracing::debug!(%locator, "List element no longer present"),
        },
        (Some(slot), None) => {
            *slot = value.map_or(FieldValue::Null, FieldValue::Text);
        }
        _ => tracing::debug!(%locator, "Locator no longer addresses a field"),
    }
}

fn clear_matching(record: &mut Record, source_url: &str) {
    for value in record.values_mut() {
        let whole_match = match value {
            FieldValue::Text(text) => text.as_str() == source_url,
            FieldValue::List(items) => {
                for item in items.iter_mut() {
                    if item.as_deref() == Some(source_url) {
                        *item = None;
                    }
                }
                false
            }
            FieldValue::Null => false,
        };
        if whole_match {
            *value = FieldValue::Null;
        }
    }
}
