use std::collections::VecDeque;
use std::path::Path;

use crate::arena::RecordArena;
use crate::models::{FetchTask, FieldLocator, FieldValue};
use crate::util::{derive_local_name, split_distinct};

/// Lazily walks a batch and yields one [`FetchTask`] per resource reference.
///
/// Only the tasks of the record currently being visited are buffered. Visiting
/// a record rewrites each of its list fields into a deduplicated
/// [`FieldValue::List`], so element indices in the emitted locators stay valid
/// until the list is joined again.
pub struct TaskEnumerator<'a> {
    arena: &'a RecordArena,
    scalar_fields: &'a [String],
    list_fields: &'a [String],
    delimiter: char,
    import_dir: &'a Path,
    next_record: usize,
    pending: VecDeque<FetchTask>,
}

impl<'a> TaskEnumerator<'a> {
    pub fn new(
        arena: &'a RecordArena,
        scalar_fields: &'a [String],
        list_fields: &'a [String],
        delimiter: char,
        import_dir: &'a Path,
    ) -> Self {
        Self {
            arena,
            scalar_fields,
            list_fields,
            delimiter,
            import_dir,
            next_record: 0,
            pending: VecDeque::new(),
        }
    }

    fn task(&self, url: &str, locator: FieldLocator) -> Option<FetchTask> {
        let local_name = derive_local_name(url);
        if local_name.is_empty() {
            tracing::debug!(%url, %locator, "Skipping reference without a file name");
            return None;
        }
        Some(FetchTask {
            source_url: url.to_string(),
            target_path: self.import_dir.join(&local_name),
            local_name,
            locator,
        })
    }

    fn visit(&mut self, index: usize) {
        let arena = self.arena;
        let Some(mut record) = arena.lock(index) else {
            return;
        };

        let (scalar_fields, list_fields) = (self.scalar_fields, self.list_fields);
        for field in scalar_fields {
            let url = match record.text(field) {
                Some(url) if !url.is_empty() => url,
                _ => continue,
            };
            if let Some(task) = self.task(url, FieldLocator::scalar(index, field)) {
                self.pending.push_back(task);
            }
        }

        for field in list_fields {
            let tokens = match record.get(field) {
                Some(FieldValue::Text(value)) => split_distinct(value, self.delimiter),
                _ => continue,
            };
            for (i, token) in tokens.iter().enumerate() {
                if token.is_empty() {
                    continue;
                }
                if let Some(task) = self.task(token, FieldLocator::element(index, field, i)) {
                    self.pending.push_back(task);
                }
            }
            record.set(
                field.clone(),
                FieldValue::List(tokens.into_iter().map(Some).collect()),
            );
        }
    }
}

impl Iterator for TaskEnumerator<'_> {
    type Item = FetchTask;

    fn next(&mut self) -> Option<FetchTask> {
        loop {
            if let Some(task) = self.pending.pop_front() {
                return Some(task);
            }
            if self.next_record >= self.arena.len() {
                return None;
            }
            let index = self.next_record;
            self.next_record += 1;
            self.visit(index);
        }
    }
}
