//! Content records: arbitrary JSON objects with some fields flagged as translatable.

use crate::i18n::Locale;
use crate::translation::batch::{is_blank, TranslationRequest};
use serde_json::{Map, Value};

/// A content record as supplied by document/announcement providers.
///
/// Only the named fields that hold non-blank strings are translated; ids,
/// URLs, dates, booleans, nulls and missing fields come back identical.
pub type ContentRecord = Map<String, Value>;

/// Where each translatable field value lives, plus the matching requests.
#[derive(Debug, Default)]
pub struct FieldPlan {
    locations: Vec<(usize, String)>,
    requests: Vec<TranslationRequest>,
}

impl FieldPlan {
    /// Collect the translatable values of `fields` across `records`, in record
    /// order then field order. Repeated field names are visited once.
    pub fn collect<S: AsRef<str>>(records: &[ContentRecord], fields: &[S], locale: Locale) -> Self {
        let mut unique_fields: Vec<&str> = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique_fields.contains(&field.as_ref()) {
                unique_fields.push(field.as_ref());
            }
        }

        let mut plan = FieldPlan::default();
        for (record_index, record) in records.iter().enumerate() {
            for field in &unique_fields {
                if let Some(Value::String(text)) = record.get(*field) {
                    if !is_blank(text) {
                        plan.locations.push((record_index, field.to_string()));
                        plan.requests.push(TranslationRequest::new(text.clone(), locale));
                    }
                }
            }
        }
        plan
    }

    pub fn requests(&self) -> &[TranslationRequest] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Write `translated` (aligned with `requests()`) back into the records.
    pub fn apply(self, records: &mut [ContentRecord], translated: Vec<String>) {
        for ((record_index, field), text) in self.locations.into_iter().zip(translated) {
            if let Some(record) = records.get_mut(record_index) {
                record.insert(field, Value::String(text));
            }
        }
    }
}
