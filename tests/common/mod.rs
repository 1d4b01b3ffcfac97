//! Shared fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use civic_translation_cache::i18n::Locale;
use civic_translation_cache::translation::{
    CacheKey, CacheStore, ProviderError, StoreError, TranslationProvider, TranslationRecord,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Provider double that records every call it receives.
///
/// Known texts come from `dictionary`; anything else is rendered as
/// `"<text> [<code>]"`.
#[derive(Default)]
pub struct SpyProvider {
    calls: AtomicUsize,
    submitted: Mutex<Vec<(Locale, Vec<String>)>>,
    dictionary: HashMap<(String, Locale), String>,
    delay: Option<Duration>,
    failing: AtomicBool,
    short_by_one: bool,
}

impl SpyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, text: &str, locale: Locale, translated: &str) -> Self {
        self.dictionary
            .insert((text.to_string(), locale), translated.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Return one translation fewer than requested.
    pub fn short_by_one(mut self) -> Self {
        self.short_by_one = true;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every `(locale, texts)` pair sent so far, in call order.
    pub fn submitted(&self) -> Vec<(Locale, Vec<String>)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn expected(&self, text: &str, locale: Locale) -> String {
        self.dictionary
            .get(&(text.to_string(), locale))
            .cloned()
            .unwrap_or_else(|| format!("{} [{}]", text, locale.code()))
    }
}

#[async_trait]
impl TranslationProvider for SpyProvider {
    async fn translate(&self, texts: &[String], target: Locale) -> Result<Vec<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push((target, texts.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("503 Service Unavailable".to_string()));
        }

        let mut translated: Vec<String> = texts.iter().map(|t| self.expected(t, target)).collect();
        if self.short_by_one {
            translated.pop();
        }
        Ok(translated)
    }
}

/// Store that is always down.
#[derive(Default)]
pub struct FailingStore {
    pub lookups: AtomicUsize,
    pub writes: AtomicUsize,
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn lookup_many(&self, _keys: &[CacheKey]) -> Result<HashMap<CacheKey, String>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }

    async fn write_many(&self, _records: &[TranslationRecord]) -> Result<u64, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
    }
}

pub fn strings(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}
