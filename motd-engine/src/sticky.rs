//! Per-group sticky state: which variant an origin saw, when, and which
//! animation phase it is pinned to.
//!
//! Entries expire lazily on read and in periodic maintenance passes. Size is
//! bounded by a two-tier eviction: oldest-by-insertion first, then a
//! deterministic sorted sample when concurrent growth outpaces the queue.
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::animation::frame_seed_for;
use crate::constants::MAINTENANCE_BATCH;
use crate::data::Variant;

/// Animation phase carried by a sticky entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSeed {
    /// Entry was created for selection only; its phase is meaningless.
    Unset,
    Seeded(u64),
}

impl FrameSeed {
    #[must_use]
    pub const fn value(self) -> Option<u64> {
        match self {
            Self::Unset => None,
            Self::Seeded(seed) => Some(seed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyEntry {
    pub variant: Arc<Variant>,
    pub created_at_ms: u64,
    pub frame_seed: FrameSeed,
}

impl StickyEntry {
    #[must_use]
    pub const fn is_valid(&self, now_ms: u64, ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) <= ttl_ms
    }
}

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired: usize,
    pub evicted_oldest: usize,
    pub evicted_sample: usize,
    pub remaining: usize,
}

#[derive(Debug)]
pub struct StickyStore {
    entries: DashMap<String, StickyEntry>,
    order: Mutex<VecDeque<String>>,
    pings: AtomicU64,
    frame_interval_ms: u64,
}

impl StickyStore {
    #[must_use]
    pub fn new(frame_interval_ms: u64) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            pings: AtomicU64::new(0),
            frame_interval_ms: frame_interval_ms.max(1),
        }
    }

    /// Valid entry for `origin`; a stale hit is removed as a side effect.
    #[must_use]
    pub fn get(&self, origin: &str, now_ms: u64, ttl_ms: u64) -> Option<StickyEntry> {
        let entry = self.entries.get(origin).map(|hit| hit.value().clone())?;
        if entry.is_valid(now_ms, ttl_ms) {
            return Some(entry);
        }
        self.entries
            .remove_if(origin, |_, current| !current.is_valid(now_ms, ttl_ms));
        None
    }

    /// Like [`Self::get`] but never mutates the store.
    #[must_use]
    pub fn peek(&self, origin: &str, now_ms: u64, ttl_ms: u64) -> Option<StickyEntry> {
        self.entries
            .get(origin)
            .map(|hit| hit.value().clone())
            .filter(|entry| entry.is_valid(now_ms, ttl_ms))
    }

    /// Build the entry `put` would store, without storing it.
    #[must_use]
    pub fn fresh_entry(
        &self,
        variant: Arc<Variant>,
        now_ms: u64,
        with_frame_seed: bool,
    ) -> StickyEntry {
        let frame_seed = if with_frame_seed {
            FrameSeed::Seeded(frame_seed_for(now_ms, self.frame_interval_ms))
        } else {
            FrameSeed::Unset
        };
        StickyEntry {
            variant,
            created_at_ms: now_ms,
            frame_seed,
        }
    }

    /// Create or overwrite the entry for `origin`.
    pub fn put(
        &self,
        origin: &str,
        variant: Arc<Variant>,
        now_ms: u64,
        with_frame_seed: bool,
    ) -> StickyEntry {
        let entry = self.fresh_entry(variant, now_ms, with_frame_seed);
        self.store(origin, entry.clone());
        entry
    }

    /// Entry `refresh_if_valid` would produce, without storing it.
    #[must_use]
    pub fn refreshed_entry(
        &self,
        existing: Option<&StickyEntry>,
        variant: Arc<Variant>,
        now_ms: u64,
        ttl_ms: u64,
        with_frame_seed: bool,
    ) -> StickyEntry {
        match existing {
            Some(current) if current.is_valid(now_ms, ttl_ms) => {
                let frame_seed = match current.frame_seed {
                    FrameSeed::Unset if with_frame_seed => FrameSeed::Seeded(frame_seed_for(
                        current.created_at_ms,
                        self.frame_interval_ms,
                    )),
                    seed => seed,
                };
                StickyEntry {
                    variant,
                    created_at_ms: current.created_at_ms,
                    frame_seed,
                }
            }
            _ => self.fresh_entry(variant, now_ms, with_frame_seed),
        }
    }

    /// Keep the creation time and frame seed of a still-valid entry while
    /// swapping its variant; otherwise behave like [`Self::put`].
    pub fn refresh_if_valid(
        &self,
        origin: &str,
        existing: Option<&StickyEntry>,
        variant: Arc<Variant>,
        now_ms: u64,
        ttl_ms: u64,
        with_frame_seed: bool,
    ) -> StickyEntry {
        let entry = self.refreshed_entry(existing, variant, now_ms, ttl_ms, with_frame_seed);
        self.store(origin, entry.clone());
        entry
    }

    fn store(&self, origin: &str, entry: StickyEntry) {
        if self.entries.insert(origin.to_string(), entry).is_none() {
            self.order.lock().push_back(origin.to_string());
        }
    }

    /// Count one ping; true when this ping should run maintenance.
    pub fn should_run_maintenance(&self, every: u64) -> bool {
        let ping = self.pings.fetch_add(1, Ordering::Relaxed) + 1;
        ping % every.max(1) == 0
    }

    #[must_use]
    pub fn pings(&self) -> u64 {
        self.pings.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.order.lock().clear();
    }

    /// Sweep a batch of stale entries, then evict down toward `capacity`.
    pub fn run_maintenance(&self, now_ms: u64, ttl_ms: u64, capacity: usize) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        let stale: Vec<String> = self
            .entries
            .iter()
            .take(MAINTENANCE_BATCH)
            .filter(|entry| !entry.value().is_valid(now_ms, ttl_ms))
            .map(|entry| entry.key().clone())
            .collect();
        for key in stale {
            if self
                .entries
                .remove_if(&key, |_, current| !current.is_valid(now_ms, ttl_ms))
                .is_some()
            {
                report.expired += 1;
            }
        }

        let excess = self.entries.len().saturating_sub(capacity);
        if excess > 0 {
            report.evicted_oldest = self.evict_oldest(excess.min(MAINTENANCE_BATCH));
        }

        let excess = self.entries.len().saturating_sub(capacity);
        if excess > 0 {
            report.evicted_sample = self.evict_sample(excess.min(MAINTENANCE_BATCH));
        }

        self.compact_order();
        report.remaining = self.entries.len();
        report
    }

    fn evict_oldest(&self, budget: usize) -> usize {
        let mut evicted = 0;
        let mut order = self.order.lock();
        let mut popped = 0;
        while evicted < budget && popped < MAINTENANCE_BATCH {
            let Some(key) = order.pop_front() else {
                break;
            };
            popped += 1;
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        evicted
    }

    fn evict_sample(&self, budget: usize) -> usize {
        let mut sample: Vec<String> = self
            .entries
            .iter()
            .take(MAINTENANCE_BATCH)
            .map(|entry| entry.key().clone())
            .collect();
        sample.sort_unstable();
        sample
            .into_iter()
            .take(budget)
            .filter(|key| self.entries.remove(key).is_some())
            .count()
    }

    /// Drop queue keys whose entries are gone so the queue tracks the map.
    fn compact_order(&self) {
        let mut order = self.order.lock();
        let mut checked = 0;
        while checked < MAINTENANCE_BATCH {
            match order.front() {
                Some(key) if !self.entries.contains_key(key) => {
                    order.pop_front();
                }
                _ => break,
            }
            checked += 1;
        }
        if order.len() > self.entries.len().saturating_mul(2) + MAINTENANCE_BATCH {
            order.retain(|key| self.entries.contains_key(key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str) -> Arc<Variant> {
        Arc::new(Variant::new(id, 1, id))
    }

    #[test]
    fn stale_entries_are_removed_on_get() {
        let store = StickyStore::new(450);
        store.put("1.1.1.1", variant("a"), 1_000, false);
        assert!(store.get("1.1.1.1", 5_000, 10_000).is_some());
        assert!(store.get("1.1.1.1", 11_001, 10_000).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn peek_never_removes() {
        let store = StickyStore::new(450);
        store.put("o", variant("a"), 0, false);
        assert!(store.peek("o", 20_000, 10_000).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_computes_seed_only_when_requested() {
        let store = StickyStore::new(500);
        let plain = store.put("a", variant("x"), 2_600, false);
        assert_eq!(plain.frame_seed, FrameSeed::Unset);
        let seeded = store.put("b", variant("x"), 2_600, true);
        assert_eq!(seeded.frame_seed, FrameSeed::Seeded(5));
    }

    #[test]
    fn refresh_keeps_window_and_phase() {
        let store = StickyStore::new(100);
        let first = store.put("o", variant("a"), 1_000, true);
        let refreshed =
            store.refresh_if_valid("o", Some(&first), variant("b"), 4_000, 10_000, true);
        assert_eq!(refreshed.variant.id, "b");
        assert_eq!(refreshed.created_at_ms, 1_000);
        assert_eq!(refreshed.frame_seed, first.frame_seed);

        let expired =
            store.refresh_if_valid("o", Some(&first), variant("c"), 20_000, 10_000, true);
        assert_eq!(expired.created_at_ms, 20_000);
        assert_eq!(expired.frame_seed, FrameSeed::Seeded(200));
    }

    #[test]
    fn refresh_seeds_unset_entry_from_creation_time() {
        let store = StickyStore::new(100);
        let first = store.put("o", variant("a"), 1_000, false);
        let refreshed =
            store.refresh_if_valid("o", Some(&first), variant("a"), 3_000, 10_000, true);
        assert_eq!(refreshed.frame_seed, FrameSeed::Seeded(10));
    }

    #[test]
    fn maintenance_cadence() {
        let store = StickyStore::new(100);
        let hits: Vec<bool> = (0..6).map(|_| store.should_run_maintenance(3)).collect();
        assert_eq!(hits, vec![false, false, true, false, false, true]);
        assert_eq!(store.pings(), 6);
    }

    #[test]
    fn maintenance_expires_then_evicts_oldest() {
        let store = StickyStore::new(100);
        for i in 0..50 {
            store.put(&format!("old-{i:02}"), variant("a"), 0, false);
        }
        for i in 0..50 {
            store.put(&format!("new-{i:02}"), variant("a"), 50_000, false);
        }
        let report = store.run_maintenance(55_000, 10_000, 20);
        assert_eq!(report.expired, 50);
        assert_eq!(report.evicted_oldest, 30);
        assert_eq!(report.remaining, 20);
        assert!(store.get("new-00", 55_000, 10_000).is_none());
        assert!(store.get("new-49", 55_000, 10_000).is_some());
    }

    #[test]
    fn maintenance_bounds_large_growth() {
        let store = StickyStore::new(100);
        for i in 0..1_000 {
            store.put(&format!("origin-{i:04}"), variant("a"), 0, false);
        }
        let mut passes = 0;
        while store.len() > 100 {
            store.run_maintenance(0, 10_000, 100);
            passes += 1;
            assert!(passes < 20, "maintenance never converged");
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn sample_eviction_covers_missing_queue_keys() {
        let store = StickyStore::new(100);
        for i in 0..10 {
            store.put(&format!("k{i}"), variant("a"), 0, false);
        }
        store.order.lock().clear();
        let report = store.run_maintenance(0, 10_000, 4);
        assert_eq!(report.evicted_oldest, 0);
        assert_eq!(report.evicted_sample, 6);
        assert!(store.get("k9", 0, 10_000).is_some());
        assert!(store.get("k0", 0, 10_000).is_none());
    }
}
