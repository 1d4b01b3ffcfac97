//! Batch coalescing: collapse duplicate requests into distinct slots and
//! scatter resolved values back to every original position.

use crate::i18n::Locale;
use crate::translation::key::{normalize, CacheKey, KeyOutcome};
use std::collections::HashMap;

/// One text to translate into one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub target_locale: Locale,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_locale: Locale) -> Self {
        Self {
            text: text.into(),
            target_locale,
        }
    }
}

/// A distinct (text, locale) pair that needs resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub key: CacheKey,
    pub text: String,
}

impl Slot {
    pub fn locale(&self) -> Locale {
        self.key.locale()
    }
}

/// Deduplicated view of a list of requests.
///
/// `index[i]` is the slot backing request `i`, or `None` when the request
/// passes through untouched (blank text, or the source locale).
#[derive(Debug, Clone, Default)]
pub struct TranslationBatch {
    slots: Vec<Slot>,
    index: Vec<Option<usize>>,
    bypassed: usize,
}

impl TranslationBatch {
    pub fn build(requests: &[TranslationRequest]) -> Self {
        let mut slots = Vec::new();
        let mut index = Vec::with_capacity(requests.len());
        let mut positions: HashMap<CacheKey, usize> = HashMap::new();
        let mut bypassed = 0;

        for request in requests {
            if is_blank(&request.text) {
                index.push(None);
                continue;
            }

            match normalize(&request.text, request.target_locale) {
                KeyOutcome::Bypass => {
                    bypassed += 1;
                    index.push(None);
                }
                KeyOutcome::Key(key) => {
                    let slot = *positions.entry(key.clone()).or_insert_with(|| {
                        slots.push(Slot {
                            key,
                            text: request.text.clone(),
                        });
                        slots.len() - 1
                    });
                    index.push(Some(slot));
                }
            }
        }

        Self {
            slots,
            index,
            bypassed,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Number of original requests.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of requests short-circuited by the source locale.
    pub fn bypassed(&self) -> usize {
        self.bypassed
    }

    /// Slot backing request `position`, if any.
    pub fn slot_for(&self, position: usize) -> Option<usize> {
        self.index.get(position).copied().flatten()
    }

    /// Map resolved slot values back onto the original requests.
    ///
    /// `resolved` is indexed by slot. Requests whose slot is unresolved, and
    /// pass-through requests, get their original text.
    pub fn scatter(&self, requests: &[TranslationRequest], resolved: &[Option<String>]) -> Vec<String> {
        requests
            .iter()
            .zip(&self.index)
            .map(|(request, slot)| {
                slot.and_then(|s| resolved.get(s).cloned().flatten())
                    .unwrap_or_else(|| request.text.clone())
            })
            .collect()
    }
}

/// Empty or whitespace-only text is never sent to a cache or the provider.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
