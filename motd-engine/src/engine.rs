//! Per-request entry point and the atomically published engine state.
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::SnapshotSource;
use crate::animation::{FrameSlot, frame_slot};
use crate::data::{Group, Snapshot, Variant};
use crate::format::{self, Dialect, DialectPreference};
use crate::players::{self, PlayerCounts};
use crate::render::{PlaceholderValues, RenderCache};
use crate::richtext::RichText;
use crate::routing::resolve_group;
use crate::selection::{self, GroupState, SelectMode, Selection, SelectionReason};

/// Attributes of one status probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Probe<'a> {
    /// Group chosen by an outer layer (access gate, command override).
    pub group: Option<&'a str>,
    pub origin: Option<&'a str>,
    pub online: u32,
    pub max: u32,
    pub virtual_host: Option<&'a str>,
}

impl<'a> Probe<'a> {
    #[must_use]
    pub const fn new(online: u32, max: u32) -> Self {
        Self {
            group: None,
            origin: None,
            online,
            max,
            virtual_host: None,
        }
    }

    #[must_use]
    pub const fn with_origin(mut self, origin: &'a str) -> Self {
        self.origin = Some(origin);
        self
    }

    #[must_use]
    pub const fn with_group(mut self, group: &'a str) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub const fn with_virtual_host(mut self, host: &'a str) -> Self {
        self.virtual_host = Some(host);
        self
    }
}

/// Everything a host needs to answer a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderResult {
    pub group_id: String,
    pub variant_id: String,
    pub frame: FrameSlot,
    pub reason: SelectionReason,
    pub rich: RichText,
    pub plain: String,
    pub lines: Vec<String>,
    pub dialect: Dialect,
    pub fallback_used: bool,
    pub counts: PlayerCounts,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadSummary {
    pub groups: usize,
    pub variants: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatEntry {
    pub group_id: String,
    pub variant_id: String,
    pub count: u64,
}

/// Snapshot plus the mutable state built for it.
#[derive(Debug)]
struct EngineState {
    snapshot: Arc<Snapshot>,
    groups: Vec<GroupState>,
    cache: RenderCache,
}

impl EngineState {
    fn build(snapshot: Snapshot) -> Self {
        let cache = RenderCache::new(&snapshot.settings);
        cache.warm(&snapshot);
        let groups = snapshot
            .groups()
            .iter()
            .map(|group| GroupState::new(group))
            .collect();
        Self {
            snapshot: Arc::new(snapshot),
            groups,
            cache,
        }
    }

    fn group(&self, index: usize) -> Option<(&Arc<Group>, &GroupState)> {
        Some((self.snapshot.groups().get(index)?, self.groups.get(index)?))
    }

    fn render(
        &self,
        group_idx: usize,
        group: &Group,
        selection: &Selection,
        probe: &Probe<'_>,
        now_ms: u64,
    ) -> RenderResult {
        let variant = &selection.variant;
        let slot = frame_slot(group, variant, selection.sticky.as_ref(), now_ms);
        let counts = players::compute(group, probe.origin, probe.online, probe.max, now_ms);

        let frame = self.cache.frame(group_idx, variant, slot);
        let values = PlaceholderValues {
            online: counts.display_online,
            max: counts.display_max,
            version: &self.snapshot.settings.version_label,
            variant_id: &variant.id,
            group_id: &group.id,
            frame: slot.index(),
            now_ms,
        };
        let parsed = frame.resolve(&values, self.cache.dialect());
        if parsed.fallback_used {
            self.cache.note_fallback(group_idx, &group.id, variant);
        }

        let plain = parsed.rich.to_plain();
        RenderResult {
            group_id: group.id.clone(),
            variant_id: variant.id.clone(),
            frame: slot,
            reason: selection.reason,
            lines: plain.split('\n').map(str::to_string).collect(),
            plain,
            rich: parsed.rich,
            dialect: parsed.dialect,
            fallback_used: parsed.fallback_used,
            counts,
            icon: variant
                .icon
                .clone()
                .or_else(|| self.snapshot.settings.default_icon.clone()),
        }
    }

    fn render_live(&self, probe: &Probe<'_>, now_ms: u64, record_stats: bool) -> RenderResult {
        let index = resolve_group(&self.snapshot, probe.group, probe.virtual_host);
        let Some((group, state)) = self.group(index) else {
            return fallback_result(probe, now_ms);
        };
        let selection = selection::select(
            group,
            state,
            probe.origin,
            now_ms,
            SelectMode::Live {
                record_pick: record_stats,
            },
        );
        if self.snapshot.settings.debug_verbose {
            log::info!(
                "probe | origin {:?} host {:?} -> {}/{} ({:?})",
                probe.origin,
                probe.virtual_host,
                group.id,
                selection.variant.id,
                selection.reason
            );
        }
        self.render(index, group, &selection, probe, now_ms)
    }

    /// Resolve every frame of every variant once and describe each one that
    /// falls back to plain text.
    fn self_test(&self) -> Vec<String> {
        let settings = &self.snapshot.settings;
        let mut failures = Vec::new();
        for (group_idx, group) in self.snapshot.groups().iter().enumerate() {
            for variant in &group.variants {
                let slots = std::iter::once(FrameSlot::Static)
                    .chain((0..variant.frames.len()).map(FrameSlot::Animated));
                for slot in slots {
                    let values = PlaceholderValues {
                        online: 0,
                        max: 0,
                        version: &settings.version_label,
                        variant_id: &variant.id,
                        group_id: &group.id,
                        frame: slot.index(),
                        now_ms: 0,
                    };
                    let parsed = self
                        .cache
                        .frame(group_idx, variant, slot)
                        .resolve(&values, self.cache.dialect());
                    if parsed.fallback_used {
                        failures.push(format!(
                            "Self-test: preset '{}' in profile '{}' ({slot:?}) falls back to plain text.",
                            variant.id, group.id
                        ));
                    }
                }
            }
        }
        log::info!("self-test | {} frames fall back to plain text", failures.len());
        failures
    }
}

/// Built-in render used when a request fails unexpectedly.
fn fallback_result(probe: &Probe<'_>, now_ms: u64) -> RenderResult {
    let variant = Variant::fallback();
    let group = Group::new(
        crate::constants::DEFAULT_GROUP_ID,
        crate::data::SelectionStrategy::Random,
        vec![variant.clone()],
    );
    let parsed = format::parse(&variant.motd, DialectPreference::Auto);
    let plain = parsed.rich.to_plain();
    RenderResult {
        group_id: group.id.clone(),
        variant_id: variant.id,
        frame: FrameSlot::Static,
        reason: SelectionReason::Random,
        lines: plain.split('\n').map(str::to_string).collect(),
        plain,
        rich: parsed.rich,
        dialect: parsed.dialect,
        fallback_used: true,
        counts: players::compute(&group, probe.origin, probe.online, probe.max, now_ms),
        icon: None,
    }
}

/// Thread-safe rendering engine.
///
/// Requests read the current state through an `ArcSwap`; a reload builds a
/// complete new state (fresh sticky stores, counters and render cache) and
/// publishes it in one store, so a request never sees a mix of old and new.
#[derive(Debug)]
pub struct MotdEngine {
    state: ArcSwap<EngineState>,
}

impl Default for MotdEngine {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl MotdEngine {
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: ArcSwap::from_pointee(EngineState::build(snapshot)),
        }
    }

    /// Publish a new snapshot, discarding all per-request state.
    ///
    /// With `debug_self_test` set, every frame is parsed once before
    /// publication and frames that fall back are added to the warnings.
    pub fn reload(&self, snapshot: Snapshot) -> ReloadSummary {
        let mut summary = ReloadSummary {
            groups: snapshot.groups().len(),
            variants: snapshot.variant_count(),
            warnings: snapshot.warnings().to_vec(),
        };
        let state = EngineState::build(snapshot);
        if state.snapshot.settings.debug_self_test {
            summary.warnings.extend(state.self_test());
        }
        self.state.store(Arc::new(state));
        log::debug!(
            "reloaded | {} profiles, {} presets, {} warnings",
            summary.groups,
            summary.variants,
            summary.warnings.len()
        );
        summary
    }

    /// Pull a snapshot from `source` and publish it. The current state is
    /// kept when loading fails.
    ///
    /// # Errors
    ///
    /// Returns the source's error if no snapshot could be produced.
    pub fn reload_from<S: SnapshotSource>(&self, source: &S) -> Result<ReloadSummary, S::Error> {
        let snapshot = source.load_snapshot()?;
        Ok(self.reload(snapshot))
    }

    /// Currently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state.load().snapshot)
    }

    /// Answer one probe. A panic inside the request is contained and
    /// answered with the built-in fallback render.
    #[must_use]
    pub fn render_for_request(
        &self,
        probe: &Probe<'_>,
        now_ms: u64,
        record_stats: bool,
    ) -> RenderResult {
        let state = self.state.load_full();
        panic::catch_unwind(AssertUnwindSafe(|| {
            state.render_live(probe, now_ms, record_stats)
        }))
        .unwrap_or_else(|_| {
            log::error!(
                "render failed for origin {:?}; serving fallback MOTD",
                probe.origin
            );
            fallback_result(probe, now_ms)
        })
    }

    /// Render without touching stats, sticky entries or rotation.
    ///
    /// `target` names a group (normal selection inside it) or a variant
    /// (searched in the active group first, then every other group).
    #[must_use]
    pub fn preview(&self, target: &str, origin: Option<&str>, now_ms: u64) -> Option<RenderResult> {
        let state = self.state.load_full();
        let snapshot = &state.snapshot;
        let probe = Probe {
            origin,
            ..Probe::new(0, 0)
        };

        if let Some(index) = snapshot.group_index(target) {
            let (group, group_state) = state.group(index)?;
            let selection =
                selection::select(group, group_state, origin, now_ms, SelectMode::Preview);
            return Some(state.render(index, group, &selection, &probe, now_ms));
        }

        let active = snapshot
            .group_index(&snapshot.settings.active_group)
            .unwrap_or(0);
        let order = std::iter::once(active)
            .chain((0..snapshot.groups().len()).filter(|index| *index != active));
        for index in order {
            let Some((group, group_state)) = state.group(index) else {
                continue;
            };
            if let Some(variant) = group.variant(target) {
                let selection =
                    selection::forced(group, group_state, Arc::clone(variant), origin, now_ms);
                return Some(state.render(index, group, &selection, &probe, now_ms));
            }
        }
        None
    }

    /// Pick counters across all groups, highest first.
    #[must_use]
    pub fn stats(&self) -> Vec<StatEntry> {
        let state = self.state.load();
        let mut stats: Vec<StatEntry> = state
            .snapshot
            .groups()
            .iter()
            .zip(&state.groups)
            .flat_map(|(group, group_state)| {
                group_state
                    .picks()
                    .into_iter()
                    .map(|(variant_id, count)| StatEntry {
                        group_id: group.id.clone(),
                        variant_id,
                        count,
                    })
            })
            .collect();
        stats.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.group_id.cmp(&b.group_id))
                .then_with(|| a.variant_id.cmp(&b.variant_id))
        });
        stats
    }

    /// Sticky entries held per group.
    #[must_use]
    pub fn sticky_sizes(&self) -> Vec<(String, usize)> {
        let state = self.state.load();
        state
            .snapshot
            .groups()
            .iter()
            .zip(&state.groups)
            .map(|(group, group_state)| (group.id.clone(), group_state.sticky.len()))
            .collect()
    }
}
