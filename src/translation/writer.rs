//! Cache writer: persists newly obtained translations off the response path.

use crate::i18n::TranslationMetrics;
use crate::translation::memo::MemoCache;
use crate::translation::store::{CacheStore, TranslationRecord};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default number of pending write batches before new ones are dropped.
pub const DEFAULT_WRITE_QUEUE_CAPACITY: usize = 1024;

enum WriteCommand {
    Persist(Vec<TranslationRecord>),
    Flush(oneshot::Sender<()>),
}

/// Handle for submitting translations to the cache tiers.
///
/// The memo cache is updated synchronously in `submit`; the persistent store
/// is written by a background task draining a bounded queue.
#[derive(Clone)]
pub struct CacheWriter {
    memo: Arc<MemoCache>,
    tx: mpsc::Sender<WriteCommand>,
}

impl CacheWriter {
    /// Start the background write task. Must be called inside a tokio runtime.
    ///
    /// The task exits once every `CacheWriter` clone has been dropped and the
    /// queue is drained.
    pub fn spawn(
        memo: Arc<MemoCache>,
        store: Arc<dyn CacheStore>,
        metrics: Arc<TranslationMetrics>,
        queue_capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let handle = tokio::spawn(run_writer(rx, store, metrics));
        (Self { memo, tx }, handle)
    }

    /// Record new translations. Never blocks and never fails.
    pub fn submit(&self, records: Vec<TranslationRecord>) {
        if records.is_empty() {
            return;
        }

        for record in &records {
            self.memo
                .insert(record.cache_key.clone(), record.translated_text.clone());
        }

        match self.tx.try_send(WriteCommand::Persist(records)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(WriteCommand::Persist(dropped))) => {
                warn!(
                    "Cache write queue full, dropping {} translation(s) (kept in memory only)",
                    dropped.len()
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) | Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Cache writer stopped, translations kept in memory only");
            }
        }
    }

    /// Wait until everything submitted before this call has been written (or
    /// its write has failed and been logged).
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done_tx)).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

impl std::fmt::Debug for CacheWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWriter")
            .field("queue_capacity", &self.tx.max_capacity())
            .finish()
    }
}

async fn run_writer(
    mut rx: mpsc::Receiver<WriteCommand>,
    store: Arc<dyn CacheStore>,
    metrics: Arc<TranslationMetrics>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            WriteCommand::Persist(records) => match store.write_many(&records).await {
                Ok(inserted) => debug!(
                    "Persisted {}/{} translation(s) (rest already stored)",
                    inserted,
                    records.len()
                ),
                Err(e) => {
                    metrics.record_store_failure();
                    warn!("Failed to persist {} translation(s): {}", records.len(), e);
                }
            },
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    info!("Cache writer stopped");
}
