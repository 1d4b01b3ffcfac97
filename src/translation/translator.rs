use crate::i18n::{Locale, MetricsReport, TranslationMetrics};
use crate::translation::batch::{Slot, TranslationBatch, TranslationRequest};
use crate::translation::content::{ContentRecord, FieldPlan};
use crate::translation::error::ProviderError;
use crate::translation::inflight::{InflightRegistry, SharedBatch};
use crate::translation::key::CacheKey;
use crate::translation::memo::{MemoCache, DEFAULT_MEMO_CAPACITY};
use crate::translation::provider::TranslationProvider;
use crate::translation::store::{CacheStore, TranslationRecord};
use crate::translation::writer::{CacheWriter, DEFAULT_WRITE_QUEUE_CAPACITY};
use futures::future::{join, join_all, FutureExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for translating dynamic content.
///
/// Resolves texts through the memo cache, then the persistent store, then
/// one provider call per target locale for whatever is left. Every method is
/// infallible: anything that cannot be translated comes back as its source
/// text.
pub struct Translator {
    memo: Arc<MemoCache>,
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn TranslationProvider>,
    writer: CacheWriter,
    inflight: Option<Arc<InflightRegistry>>,
    metrics: Arc<TranslationMetrics>,
}

pub struct TranslatorBuilder {
    provider: Arc<dyn TranslationProvider>,
    store: Arc<dyn CacheStore>,
    memo: Option<Arc<MemoCache>>,
    memo_capacity: usize,
    write_queue_capacity: usize,
    single_flight: bool,
}

impl TranslatorBuilder {
    pub fn memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    /// Use an existing memo cache instead of creating one.
    pub fn memo(mut self, memo: Arc<MemoCache>) -> Self {
        self.memo = Some(memo);
        self
    }

    pub fn write_queue_capacity(mut self, capacity: usize) -> Self {
        self.write_queue_capacity = capacity;
        self
    }

    /// Share one provider call between concurrent misses of the same key.
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Build the translator and start its cache writer task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Translator {
        let memo = self
            .memo
            .unwrap_or_else(|| Arc::new(MemoCache::new(self.memo_capacity)));
        let metrics = Arc::new(TranslationMetrics::new());
        let (writer, _task) = CacheWriter::spawn(
            Arc::clone(&memo),
            Arc::clone(&self.store),
            Arc::clone(&metrics),
            self.write_queue_capacity,
        );

        Translator {
            memo,
            store: self.store,
            provider: self.provider,
            writer,
            inflight: self.single_flight.then(|| Arc::new(InflightRegistry::new())),
            metrics,
        }
    }
}

impl Translator {
    pub fn builder(
        provider: Arc<dyn TranslationProvider>,
        store: Arc<dyn CacheStore>,
    ) -> TranslatorBuilder {
        TranslatorBuilder {
            provider,
            store,
            memo: None,
            memo_capacity: DEFAULT_MEMO_CAPACITY,
            write_queue_capacity: DEFAULT_WRITE_QUEUE_CAPACITY,
            single_flight: true,
        }
    }

    /// Translate a single text. Returns `text` unchanged for the source
    /// locale, for blank text, and when translation fails.
    pub async fn translate_text(&self, text: &str, target: Locale) -> String {
        let requests = [TranslationRequest::new(text, target)];
        self.translate_requests(&requests)
            .await
            .pop()
            .unwrap_or_else(|| text.to_string())
    }

    /// Translate many texts into one locale. Output is aligned with input.
    pub async fn translate_texts(&self, texts: &[String], target: Locale) -> Vec<String> {
        let requests: Vec<TranslationRequest> = texts
            .iter()
            .map(|text| TranslationRequest::new(text.clone(), target))
            .collect();
        self.translate_requests(&requests).await
    }

    /// Translate the named fields of every record.
    ///
    /// Returns the same records in the same order. Only string values of the
    /// named fields change; null and missing fields are left as they are.
    pub async fn translate_content_array<S: AsRef<str>>(
        &self,
        mut records: Vec<ContentRecord>,
        fields: &[S],
        target: Locale,
    ) -> Vec<ContentRecord> {
        if target.is_source() {
            self.metrics.record_bypass();
            return records;
        }

        let plan = FieldPlan::collect(&records, fields, target);
        if plan.is_empty() {
            return records;
        }

        let translated = self.translate_requests(plan.requests()).await;
        plan.apply(&mut records, translated);
        records
    }

    /// Translate a batch of possibly mixed-locale requests.
    ///
    /// `result[i]` always corresponds to `requests[i]`. Duplicate texts are
    /// resolved once and scattered back to every position.
    pub async fn translate_requests(&self, requests: &[TranslationRequest]) -> Vec<String> {
        let batch = TranslationBatch::build(requests);
        for _ in 0..batch.bypassed() {
            self.metrics.record_bypass();
        }

        let slots = batch.slots();
        if slots.is_empty() {
            return batch.scatter(requests, &[]);
        }

        let mut resolved: Vec<Option<String>> = vec![None; slots.len()];

        let memo_hits = self.resolve_from_memo(slots, &mut resolved);
        let store_hits = self.resolve_from_store(slots, &mut resolved).await;

        let mut misses_by_locale: BTreeMap<Locale, Vec<usize>> = BTreeMap::new();
        for (index, slot) in slots.iter().enumerate() {
            if resolved[index].is_none() {
                misses_by_locale.entry(slot.locale()).or_default().push(index);
            }
        }
        let misses: usize = misses_by_locale.values().map(Vec::len).sum();

        self.metrics.record_memo_hits(memo_hits);
        self.metrics.record_store_hits(store_hits);
        self.metrics.record_cache_misses(misses);
        debug!(
            "Translation batch: {} requests, {} distinct, {} memo hits, {} store hits, {} misses",
            requests.len(),
            slots.len(),
            memo_hits,
            store_hits,
            misses
        );

        let fetches = misses_by_locale.into_iter().map(|(locale, indices)| {
            let missed: Vec<&Slot> = indices.iter().map(|&i| &slots[i]).collect();
            self.fetch_misses(locale, missed)
                .map(move |translated| (indices, translated))
        });
        for (indices, translated) in join_all(fetches).await {
            for (index, value) in indices.into_iter().zip(translated) {
                resolved[index] = value;
            }
        }

        batch.scatter(requests, &resolved)
    }

    /// Wait for queued cache writes to reach the persistent store.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    pub fn memo(&self) -> &Arc<MemoCache> {
        &self.memo
    }

    fn resolve_from_memo(&self, slots: &[Slot], resolved: &mut [Option<String>]) -> usize {
        let mut hits = 0;
        for (slot, value) in slots.iter().zip(resolved.iter_mut()) {
            if let Some(translated) = self.memo.get(&slot.key) {
                *value = Some(translated);
                hits += 1;
            }
        }
        hits
    }

    async fn resolve_from_store(&self, slots: &[Slot], resolved: &mut [Option<String>]) -> usize {
        let pending: Vec<usize> = (0..slots.len()).filter(|&i| resolved[i].is_none()).collect();
        if pending.is_empty() {
            return 0;
        }

        let keys: Vec<CacheKey> = pending.iter().map(|&i| slots[i].key.clone()).collect();
        let found = match self.store.lookup_many(&keys).await {
            Ok(found) => found,
            Err(e) => {
                self.metrics.record_store_failure();
                warn!(
                    "Cache store lookup failed, treating {} key(s) as misses: {}",
                    keys.len(),
                    e
                );
                return 0;
            }
        };

        let mut hits = 0;
        for index in pending {
            let key = &slots[index].key;
            if let Some(translated) = found.get(key) {
                self.memo.insert(key.clone(), translated.clone());
                resolved[index] = Some(translated.clone());
                hits += 1;
            }
        }
        hits
    }

    /// Resolve cache misses for one locale through the provider. The result
    /// is aligned with `missed`; `None` means the text stays untranslated.
    async fn fetch_misses(&self, locale: Locale, missed: Vec<&Slot>) -> Vec<Option<String>> {
        let texts: Vec<String> = missed.iter().map(|slot| slot.text.clone()).collect();

        let Some(registry) = &self.inflight else {
            return match self.provider_call(texts.clone(), locale).await {
                Ok(translated) => translated.iter().cloned().map(Some).collect(),
                Err(_) => vec![None; texts.len()],
            };
        };

        let keys: Vec<CacheKey> = missed.iter().map(|slot| slot.key.clone()).collect();
        let flight = registry.claim(&keys, |owned| {
            let owned_texts = owned.iter().map(|&i| texts[i].clone()).collect();
            self.provider_call(owned_texts, locale)
        });

        let owner = async {
            match &flight.batch {
                Some(batch) => Some(batch.clone().await),
                None => None,
            }
        };
        let joiners = join_all(flight.joined.iter().map(|(_, pending)| pending.clone()));
        let (owned_result, joined_results) = join(owner, joiners).await;

        let mut out: Vec<Option<String>> = vec![None; texts.len()];
        if let Some(Ok(translated)) = owned_result {
            for (offset, &index) in flight.owned.iter().enumerate() {
                out[index] = translated.get(offset).cloned();
            }
        }
        for ((index, _), value) in flight.joined.iter().zip(joined_results) {
            out[*index] = value;
        }

        // The shared call populated the memo before resolving, so releasing
        // the keys now cannot send a later caller to the provider.
        flight.finish();
        out
    }

    /// Build the (lazy, shareable) provider call for `texts`.
    ///
    /// Whichever caller drives the call to completion hands the results to
    /// the cache writer, so a cancelled owner does not lose them. Failures
    /// are logged here, once per call, however many callers await it.
    fn provider_call(&self, texts: Vec<String>, locale: Locale) -> SharedBatch {
        let provider = Arc::clone(&self.provider);
        let metrics = Arc::clone(&self.metrics);
        let writer = self.writer.clone();

        async move {
            metrics.record_provider_call(texts.len());
            let result = provider.translate(&texts, locale).await.and_then(|translated| {
                if translated.len() == texts.len() {
                    Ok(translated)
                } else {
                    Err(ProviderError::MalformedResponse(format!(
                        "expected {} translations, got {}",
                        texts.len(),
                        translated.len()
                    )))
                }
            });

            match result {
                Ok(translated) => {
                    writer.submit(records_for(&texts, locale, &translated));
                    Ok(Arc::new(translated))
                }
                Err(e) => {
                    metrics.record_provider_failure();
                    warn!(
                        "Translation to {} failed for {} text(s), serving source text: {}",
                        locale.code(),
                        texts.len(),
                        e
                    );
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }

}

fn records_for(texts: &[String], locale: Locale, translated: &[String]) -> Vec<TranslationRecord> {
    texts
        .iter()
        .zip(translated)
        .map(|(text, translation)| TranslationRecord::new(text.clone(), locale, translation.clone()))
        .collect()
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("memo", &self.memo)
            .field("writer", &self.writer)
            .field("single_flight", &self.inflight.is_some())
            .finish()
    }
}
