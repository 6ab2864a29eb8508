//! Variant selection strategies and the per-group state they consult.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use crate::data::{Group, SelectionStrategy, Variant};
use crate::numbers::index_mod;
use crate::seed::{entropy, origin_hash, sticky_seed, time_seed};
use crate::sticky::{StickyEntry, StickyStore};
use crate::weighted;

/// Why a variant was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// Reused the origin's valid sticky entry.
    StickyHit,
    /// Weighted pick stored as a new sticky entry.
    StickyNew,
    Hashed,
    Rotated,
    Random,
    /// Origin-based strategy without an origin; time-seeded instead.
    OriginUnknown,
    /// Variant named explicitly by a preview.
    Forced,
}

/// Whether a selection may touch shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Live { record_pick: bool },
    /// No pick counters, no sticky writes, no rotation advance.
    Preview,
}

impl SelectMode {
    const fn is_live(self) -> bool {
        matches!(self, Self::Live { .. })
    }

    const fn records_pick(self) -> bool {
        matches!(self, Self::Live { record_pick: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub variant: Arc<Variant>,
    pub sticky: Option<StickyEntry>,
    pub reason: SelectionReason,
}

/// Mutable per-group state owned by one published engine state.
#[derive(Debug)]
pub struct GroupState {
    pub sticky: StickyStore,
    rotation: AtomicU64,
    picks: DashMap<String, AtomicU64>,
}

impl GroupState {
    #[must_use]
    pub fn new(group: &Group) -> Self {
        Self {
            sticky: StickyStore::new(group.animation.frame_interval_ms),
            rotation: AtomicU64::new(0),
            picks: DashMap::new(),
        }
    }

    /// Add one pick for `variant_id`.
    pub fn record_pick(&self, variant_id: &str) {
        if let Some(counter) = self.picks.get(variant_id) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.picks
            .entry(variant_id.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of accumulated pick counters.
    #[must_use]
    pub fn picks(&self) -> Vec<(String, u64)> {
        self.picks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }

    fn next_rotation(&self, mode: SelectMode) -> u64 {
        if mode.is_live() {
            self.rotation.fetch_add(1, Ordering::Relaxed)
        } else {
            self.rotation.load(Ordering::Relaxed)
        }
    }
}

fn weighted_variant(group: &Group, seed: u64) -> Arc<Variant> {
    match weighted::pick(&group.variants, seed) {
        Ok(variant) => Arc::clone(variant),
        Err(_) => Arc::new(Variant::fallback()),
    }
}

fn indexed_variant(group: &Group, value: u64) -> Arc<Variant> {
    group
        .variants
        .get(index_mod(value, group.variants.len()))
        .map_or_else(|| Arc::new(Variant::fallback()), Arc::clone)
}

/// Pick the variant for one probe.
///
/// Sticky selection reuses a valid entry or stores a new weighted pick.
/// Hashed, rotating and random selection are not sticky themselves, but
/// still maintain an entry to carry the frame seed when the group animates
/// per origin.
pub fn select(
    group: &Group,
    state: &GroupState,
    origin: Option<&str>,
    now_ms: u64,
    mode: SelectMode,
) -> Selection {
    let ttl = group.sticky_ttl_ms;
    let per_origin_frames = group.animation.per_origin();

    let existing = origin.and_then(|key| {
        if mode.is_live() {
            state.sticky.get(key, now_ms, ttl)
        } else {
            state.sticky.peek(key, now_ms, ttl)
        }
    });

    let selection = match (group.strategy, origin) {
        (SelectionStrategy::StickyPerOrigin, Some(key)) => match existing {
            Some(entry) => Selection {
                variant: Arc::clone(&entry.variant),
                sticky: Some(entry),
                reason: SelectionReason::StickyHit,
            },
            None => {
                let variant = weighted_variant(group, sticky_seed(key, now_ms));
                let entry = if mode.is_live() {
                    state
                        .sticky
                        .put(key, Arc::clone(&variant), now_ms, per_origin_frames)
                } else {
                    state
                        .sticky
                        .fresh_entry(Arc::clone(&variant), now_ms, per_origin_frames)
                };
                Selection {
                    variant,
                    sticky: Some(entry),
                    reason: SelectionReason::StickyNew,
                }
            }
        },
        (SelectionStrategy::StickyPerOrigin, None) => Selection {
            variant: weighted_variant(group, time_seed(now_ms)),
            sticky: None,
            reason: SelectionReason::OriginUnknown,
        },
        (SelectionStrategy::HashedPerOrigin, Some(key)) => frame_carrier(
            group,
            state,
            key,
            existing.as_ref(),
            indexed_variant(group, origin_hash(key)),
            SelectionReason::Hashed,
            now_ms,
            mode,
        ),
        (SelectionStrategy::HashedPerOrigin, None) => Selection {
            variant: indexed_variant(group, now_ms),
            sticky: None,
            reason: SelectionReason::OriginUnknown,
        },
        (SelectionStrategy::Rotate, origin) => {
            let variant = indexed_variant(group, state.next_rotation(mode));
            carry_if_known(
                group,
                state,
                origin,
                existing.as_ref(),
                variant,
                SelectionReason::Rotated,
                now_ms,
                mode,
            )
        }
        (SelectionStrategy::Random, origin) => {
            let variant = weighted_variant(group, entropy());
            carry_if_known(
                group,
                state,
                origin,
                existing.as_ref(),
                variant,
                SelectionReason::Random,
                now_ms,
                mode,
            )
        }
    };

    if mode.records_pick() {
        state.record_pick(&selection.variant.id);
    }
    if mode.is_live() && state.sticky.should_run_maintenance(group.cleanup_every) {
        let report = state
            .sticky
            .run_maintenance(now_ms, ttl, group.sticky_capacity);
        log::debug!(
            "sticky maintenance | group {} expired {} evicted {}+{} remaining {}",
            group.id,
            report.expired,
            report.evicted_oldest,
            report.evicted_sample,
            report.remaining
        );
    }

    selection
}

#[allow(clippy::too_many_arguments)]
fn carry_if_known(
    group: &Group,
    state: &GroupState,
    origin: Option<&str>,
    existing: Option<&StickyEntry>,
    variant: Arc<Variant>,
    reason: SelectionReason,
    now_ms: u64,
    mode: SelectMode,
) -> Selection {
    match origin {
        Some(key) => frame_carrier(group, state, key, existing, variant, reason, now_ms, mode),
        None => Selection {
            variant,
            sticky: None,
            reason,
        },
    }
}

/// Non-sticky selection that still refreshes the origin's frame seed.
#[allow(clippy::too_many_arguments)]
fn frame_carrier(
    group: &Group,
    state: &GroupState,
    origin: &str,
    existing: Option<&StickyEntry>,
    variant: Arc<Variant>,
    reason: SelectionReason,
    now_ms: u64,
    mode: SelectMode,
) -> Selection {
    if !group.animation.per_origin() {
        return Selection {
            variant,
            sticky: None,
            reason,
        };
    }
    let ttl = group.sticky_ttl_ms;
    let entry = if mode.is_live() {
        state
            .sticky
            .refresh_if_valid(origin, existing, Arc::clone(&variant), now_ms, ttl, true)
    } else {
        state
            .sticky
            .refreshed_entry(existing, Arc::clone(&variant), now_ms, ttl, true)
    };
    Selection {
        variant,
        sticky: Some(entry),
        reason,
    }
}

/// Selection of a named variant, used by previews.
#[must_use]
pub fn forced(
    group: &Group,
    state: &GroupState,
    variant: Arc<Variant>,
    origin: Option<&str>,
    now_ms: u64,
) -> Selection {
    let sticky = origin
        .filter(|_| group.animation.per_origin())
        .map(|key| {
            let existing = state.sticky.peek(key, now_ms, group.sticky_ttl_ms);
            state.sticky.refreshed_entry(
                existing.as_ref(),
                Arc::clone(&variant),
                now_ms,
                group.sticky_ttl_ms,
                true,
            )
        });
    Selection {
        variant,
        sticky,
        reason: SelectionReason::Forced,
    }
}
