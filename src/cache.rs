//! Single-slot response cache for the product list.
//!
//! The slot is either empty or holds the complete list from one successful
//! upstream round. Writes replace the whole payload. While a round is in
//! flight it is published in the slot, and every request that misses the
//! cache awaits that same round and gets its outcome, success or failure.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::models::ProductQuote;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

pub type Payload = Arc<Vec<ProductQuote>>;

type Round<E> = Shared<BoxFuture<'static, Result<Payload, E>>>;

/// How `get_or_refresh` produced its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Fresh payload already in the slot.
    Hit,
    /// This request started the upstream round.
    Refreshed,
    /// Another request's round was already in flight.
    Joined,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Refreshed => "refreshed",
            CacheStatus::Joined => "joined",
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheEntry {
    written_at: Option<Instant>,
    payload: Option<Payload>,
}

impl CacheEntry {
    /// Cached payload if it was written less than `ttl` before `now`.
    pub fn read(&self, now: Instant, ttl: Duration) -> Option<Payload> {
        let written_at = self.written_at?;
        if now.saturating_duration_since(written_at) < ttl {
            self.payload.clone()
        } else {
            None
        }
    }

    pub fn write(&mut self, payload: Payload, now: Instant) {
        self.written_at = Some(now);
        self.payload = Some(payload);
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }
}

struct Slot<E> {
    entry: CacheEntry,
    in_flight: Option<Round<E>>,
}

pub struct PriceCache<E> {
    ttl: Duration,
    slot: Mutex<Slot<E>>,
}

impl<E> PriceCache<E> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(Slot {
                entry: CacheEntry::default(),
                in_flight: None,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn read(&self, now: Instant) -> Option<Payload> {
        self.slot.lock().await.entry.read(now, self.ttl)
    }

    pub async fn write(&self, payload: Payload, now: Instant) {
        self.slot.lock().await.entry.write(payload, now);
    }

    /// Time since the last successful write, if any.
    pub async fn age(&self, now: Instant) -> Option<Duration> {
        let slot = self.slot.lock().await;
        slot.entry
            .written_at
            .map(|written_at| now.saturating_duration_since(written_at))
    }
}

impl<E> PriceCache<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Serve the cached payload, or run `refresh` and store its result.
    ///
    /// At most one refresh runs at a time. Callers that miss while a round is
    /// in flight await that round instead of starting their own, so nobody
    /// waits longer than one round. Failed rounds leave the slot untouched.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<(Payload, CacheStatus), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ProductQuote>, E>> + Send + 'static,
    {
        let (round, status) = {
            let mut slot = self.slot.lock().await;
            if let Some(payload) = slot.entry.read(Instant::now(), self.ttl) {
                debug!(rows = payload.len(), "price cache hit");
                return Ok((payload, CacheStatus::Hit));
            }

            if let Some(round) = slot.in_flight.clone() {
                debug!("price cache miss, joining in-flight refresh");
                (round, CacheStatus::Joined)
            } else {
                debug!(cold = slot.entry.is_empty(), "price cache miss, refreshing");
                let pending = refresh();
                let round = async move { pending.await.map(Arc::new) }.boxed().shared();
                slot.in_flight = Some(round.clone());
                (round, CacheStatus::Refreshed)
            }
        };

        let outcome = round.clone().await;

        // First caller back retires the round; only a success is stored.
        let mut slot = self.slot.lock().await;
        if slot
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&round))
        {
            slot.in_flight = None;
            if let Ok(payload) = &outcome {
                slot.entry.write(payload.clone(), Instant::now());
            }
        }

        outcome.map(|payload| (payload, status))
    }
}

impl<E> Default for PriceCache<E> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
