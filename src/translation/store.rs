//! Persistent cache store: durable key → translation records.
//!
//! Records are append-only. Both implementations insert-if-absent and never
//! overwrite an existing translation, which makes duplicate concurrent writes
//! of the same key harmless.

use crate::i18n::Locale;
use crate::translation::error::StoreError;
use crate::translation::key::CacheKey;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

/// One persisted translation of one source text into one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    pub cache_key: CacheKey,
    pub source_text: String,
    pub translated_text: String,
    pub created_at: DateTime<Utc>,
}

impl TranslationRecord {
    pub fn new(source_text: impl Into<String>, locale: Locale, translated_text: String) -> Self {
        let source_text = source_text.into();
        Self {
            cache_key: CacheKey::new(&source_text, locale),
            source_text,
            translated_text,
            created_at: Utc::now(),
        }
    }

    pub fn target_locale(&self) -> Locale {
        self.cache_key.locale()
    }
}

/// Durable translation cache, queried and written in batches.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch every stored translation among `keys`. Absent keys are simply
    /// missing from the returned map.
    async fn lookup_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, String>, StoreError>;

    /// Insert records whose key is not stored yet. Returns how many rows were
    /// actually inserted.
    async fn write_many(&self, records: &[TranslationRecord]) -> Result<u64, StoreError>;
}

// ==================== PostgreSQL ====================

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS translation_records (
    source_hash     TEXT        NOT NULL,
    target_locale   TEXT        NOT NULL,
    source_text     TEXT        NOT NULL,
    translated_text TEXT        NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (source_hash, target_locale)
)";

const LOOKUP_SQL: &str = "SELECT source_hash, target_locale, translated_text
    FROM translation_records
    WHERE (source_hash, target_locale) IN (
        SELECT * FROM UNNEST($1::text[], $2::text[])
    )";

const INSERT_SQL: &str = "INSERT INTO translation_records
        (source_hash, target_locale, source_text, translated_text, created_at)
    SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::timestamptz[])
    ON CONFLICT (source_hash, target_locale) DO NOTHING";

/// `CacheStore` backed by a PostgreSQL table.
#[derive(Debug, Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    /// Connect to the database and make sure the table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `translation_records` table if it does not exist.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        info!("translation_records table ready");
        Ok(())
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn lookup_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, String>, StoreError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let hashes: Vec<String> = keys.iter().map(|k| k.text_hash().to_string()).collect();
        let locales: Vec<String> = keys.iter().map(|k| k.locale().code().to_string()).collect();

        let rows = sqlx::query(LOOKUP_SQL)
            .bind(&hashes)
            .bind(&locales)
            .fetch_all(&self.pool)
            .await?;

        let mut found = HashMap::with_capacity(rows.len());
        for row in rows {
            let hash: String = row.try_get("source_hash")?;
            let locale_code: String = row.try_get("target_locale")?;
            let translated: String = row.try_get("translated_text")?;
            let locale = Locale::from_code(&locale_code)
                .map_err(|e| StoreError::InvalidRow(e.to_string()))?;
            found.insert(CacheKey::from_parts(hash, locale), translated);
        }

        debug!("Store lookup: {}/{} keys found", found.len(), keys.len());
        Ok(found)
    }

    async fn write_many(&self, records: &[TranslationRecord]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut hashes = Vec::with_capacity(records.len());
        let mut locales = Vec::with_capacity(records.len());
        let mut sources = Vec::with_capacity(records.len());
        let mut translations = Vec::with_capacity(records.len());
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            hashes.push(record.cache_key.text_hash().to_string());
            locales.push(record.target_locale().code().to_string());
            sources.push(record.source_text.clone());
            translations.push(record.translated_text.clone());
            created.push(record.created_at);
        }

        let result = sqlx::query(INSERT_SQL)
            .bind(&hashes)
            .bind(&locales)
            .bind(&sources)
            .bind(&translations)
            .bind(&created)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// ==================== In-memory ====================

/// `CacheStore` kept in process memory.
///
/// Used when no database is configured and as an isolated store in tests.
/// Contents do not survive a restart.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    records: RwLock<HashMap<CacheKey, TranslationRecord>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Fetch the full stored record for a key.
    pub fn record(&self, key: &CacheKey) -> Option<TranslationRecord> {
        self.read().get(key).cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CacheKey, TranslationRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn lookup_many(&self, keys: &[CacheKey]) -> Result<HashMap<CacheKey, String>, StoreError> {
        let records = self.read();
        Ok(keys
            .iter()
            .filter_map(|key| {
                records
                    .get(key)
                    .map(|record| (key.clone(), record.translated_text.clone()))
            })
            .collect())
    }

    async fn write_many(&self, records: &[TranslationRecord]) -> Result<u64, StoreError> {
        let mut stored = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut inserted = 0;
        for record in records {
            if !stored.contains_key(&record.cache_key) {
                stored.insert(record.cache_key.clone(), record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, locale: Locale, translated: &str) -> TranslationRecord {
        TranslationRecord::new(text, locale, translated.to_string())
    }

    // ==================== TranslationRecord Tests ====================

    #[test]
    fn test_record_key_matches_text_and_locale() {
        let r = record("Anunț important", Locale::English, "Important announcement");
        assert_eq!(r.cache_key, CacheKey::new("Anunț important", Locale::English));
        assert_eq!(r.target_locale(), Locale::English);
    }

    #[test]
    fn test_record_created_at_is_recent() {
        let before = Utc::now();
        let r = record("Salut", Locale::English, "Hello");
        assert!(r.created_at >= before);
        assert!(r.created_at <= Utc::now());
    }

    // ==================== InMemoryCacheStore Tests ====================

    #[tokio::test]
    async fn test_lookup_empty_store() {
        let store = InMemoryCacheStore::new();
        let found = store
            .lookup_many(&[CacheKey::new("Salut", Locale::English)])
            .await
            .expect("lookup");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_lookup() {
        let store = InMemoryCacheStore::new();
        let inserted = store
            .write_many(&[
                record("Salut", Locale::English, "Hello"),
                record("Salut", Locale::Hungarian, "Szia"),
            ])
            .await
            .expect("write");
        assert_eq!(inserted, 2);

        let en = CacheKey::new("Salut", Locale::English);
        let hu = CacheKey::new("Salut", Locale::Hungarian);
        let missing = CacheKey::new("Pa", Locale::English);
        let found = store
            .lookup_many(&[en.clone(), hu.clone(), missing.clone()])
            .await
            .expect("lookup");

        assert_eq!(found.len(), 2);
        assert_eq!(found.get(&en), Some(&"Hello".to_string()));
        assert_eq!(found.get(&hu), Some(&"Szia".to_string()));
        assert!(!found.contains_key(&missing));
    }

    #[tokio::test]
    async fn test_write_never_overwrites() {
        let store = InMemoryCacheStore::new();
        store
            .write_many(&[record("Salut", Locale::English, "Hello")])
            .await
            .expect("first write");
        let inserted = store
            .write_many(&[record("Salut", Locale::English, "Hi there")])
            .await
            .expect("second write");

        assert_eq!(inserted, 0);
        let stored = store
            .record(&CacheKey::new("Salut", Locale::English))
            .expect("record exists");
        assert_eq!(stored.translated_text, "Hello");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_keys_in_one_write() {
        let store = InMemoryCacheStore::new();
        let inserted = store
            .write_many(&[
                record("Salut", Locale::English, "Hello"),
                record("Salut", Locale::English, "Hello"),
            ])
            .await
            .expect("write");
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_write_empty_batch() {
        let store = InMemoryCacheStore::new();
        assert_eq!(store.write_many(&[]).await.expect("write"), 0);
        assert!(store.is_empty());
    }

    // ==================== PgCacheStore Tests ====================
    //
    // These run against a real database: set TEST_DATABASE_URL and pass
    // `--ignored` to include them.

    async fn pg_store() -> PgCacheStore {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
        PgCacheStore::connect(&url).await.expect("connect")
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_write_then_lookup() {
        let store = pg_store().await;
        let text = format!("Anunț {}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let r = record(&text, Locale::English, "Announcement");

        assert_eq!(store.write_many(&[r.clone()]).await.expect("write"), 1);
        let found = store
            .lookup_many(&[r.cache_key.clone()])
            .await
            .expect("lookup");
        assert_eq!(found.get(&r.cache_key), Some(&"Announcement".to_string()));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_write_is_insert_if_absent() {
        let store = pg_store().await;
        let text = format!("Ședință {}", Utc::now().timestamp_nanos_opt().unwrap_or_default());

        store
            .write_many(&[record(&text, Locale::Hungarian, "Ülés")])
            .await
            .expect("first write");
        let inserted = store
            .write_many(&[record(&text, Locale::Hungarian, "Gyűlés")])
            .await
            .expect("second write");
        assert_eq!(inserted, 0);

        let key = CacheKey::new(&text, Locale::Hungarian);
        let found = store.lookup_many(&[key.clone()]).await.expect("lookup");
        assert_eq!(found.get(&key), Some(&"Ülés".to_string()));
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_pg_empty_inputs_skip_database() {
        let store = pg_store().await;
        assert!(store.lookup_many(&[]).await.expect("lookup").is_empty());
        assert_eq!(store.write_many(&[]).await.expect("write"), 0);
    }
}
