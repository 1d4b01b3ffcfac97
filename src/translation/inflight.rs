//! Single-flight registry for provider calls.
//!
//! While a provider call for a key is in flight, later callers missing the
//! same key await that call instead of issuing their own. Entries live only
//! as long as the call that registered them.

use crate::translation::error::ProviderError;
use crate::translation::key::CacheKey;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A provider call shared between its owner and any joiners. Results are in
/// the order of the texts the owner submitted.
pub type SharedBatch = Shared<BoxFuture<'static, Result<Arc<Vec<String>>, ProviderError>>>;

/// The eventual translation of one key; `None` if the call failed.
pub type SharedTranslation = Shared<BoxFuture<'static, Option<String>>>;

struct Entry {
    flight_id: u64,
    translation: SharedTranslation,
}

#[derive(Default)]
pub struct InflightRegistry {
    pending: Mutex<HashMap<CacheKey, Entry>>,
    next_flight_id: AtomicU64,
}

/// Result of claiming a set of keys.
pub struct Flight {
    /// `(position in claimed keys, pending translation)` for keys someone else is fetching.
    pub joined: Vec<(usize, SharedTranslation)>,
    /// Positions of the keys this caller must fetch, in submission order.
    pub owned: Vec<usize>,
    /// The call for `owned`, if any. Not started until polled.
    pub batch: Option<SharedBatch>,
    guard: Option<FlightGuard>,
}

impl Flight {
    /// Stop advertising the owned keys. Dropping the flight does the same.
    pub fn finish(mut self) {
        self.guard.take();
    }
}

struct FlightGuard {
    registry: Arc<InflightRegistry>,
    flight_id: u64,
    keys: Vec<CacheKey>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut pending = self.registry.lock();
        for key in &self.keys {
            if pending
                .get(key)
                .is_some_and(|entry| entry.flight_id == self.flight_id)
            {
                pending.remove(key);
            }
        }
    }
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently being fetched.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Split `keys` into ones already in flight and ones this caller owns.
    ///
    /// `start` receives the owned positions and builds the call for them; it
    /// runs under the registry lock, so it must only construct the future.
    pub fn claim<F>(self: &Arc<Self>, keys: &[CacheKey], start: F) -> Flight
    where
        F: FnOnce(&[usize]) -> SharedBatch,
    {
        let mut pending = self.lock();

        let mut joined = Vec::new();
        let mut owned = Vec::new();
        for (position, key) in keys.iter().enumerate() {
            match pending.get(key) {
                Some(entry) => joined.push((position, entry.translation.clone())),
                None => owned.push(position),
            }
        }

        if owned.is_empty() {
            return Flight {
                joined,
                owned,
                batch: None,
                guard: None,
            };
        }

        let flight_id = self.next_flight_id.fetch_add(1, Ordering::Relaxed);
        let batch = start(&owned);
        let mut guard_keys = Vec::with_capacity(owned.len());
        for (offset, &position) in owned.iter().enumerate() {
            let translation = batch
                .clone()
                .map(move |result| result.ok().and_then(|texts| texts.get(offset).cloned()))
                .boxed()
                .shared();
            let key = keys[position].clone();
            pending.insert(
                key.clone(),
                Entry {
                    flight_id,
                    translation,
                },
            );
            guard_keys.push(key);
        }

        Flight {
            joined,
            owned,
            batch: Some(batch),
            guard: Some(FlightGuard {
                registry: Arc::clone(self),
                flight_id,
                keys: guard_keys,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
