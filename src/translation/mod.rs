//! Translation cache and batch-coalescing layer.
//!
//! Sits between content-fetching code and a metered translation API:
//!
//! - `key`: cache key derivation and the source-locale bypass
//! - `memo`: bounded in-process LRU
//! - `store`: durable insert-if-absent record store (PostgreSQL or in-memory)
//! - `provider`: single-attempt HTTP adapter with chunking
//! - `writer`: memo write plus background persistence
//! - `batch`: dedup and scatter for a list of requests
//! - `inflight`: single-flight sharing of concurrent identical misses
//! - `translator`: the public entry points
//!
//! # Example
//!
//! ```rust,ignore
//! let translator = Translator::builder(provider, store).build();
//! let title = translator.translate_text("Anunț important", Locale::English).await;
//! ```

pub mod batch;
pub mod content;
pub mod error;
pub mod inflight;
pub mod key;
pub mod memo;
pub mod provider;
pub mod store;
pub mod translator;
pub mod writer;

pub use batch::{TranslationBatch, TranslationRequest};
pub use content::ContentRecord;
pub use error::{ProviderError, StoreError};
pub use key::{normalize, CacheKey, KeyOutcome};
pub use memo::MemoCache;
pub use provider::{HttpTranslationProvider, TranslationProvider};
pub use store::{CacheStore, InMemoryCacheStore, PgCacheStore, TranslationRecord};
pub use translator::{Translator, TranslatorBuilder};
pub use writer::CacheWriter;
