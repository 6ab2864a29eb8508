//! Animation clock: which frame of a variant is showing right now.
use serde::Serialize;

use crate::data::{FrameScope, Group, Variant};
use crate::numbers::index_mod;
use crate::sticky::StickyEntry;

/// Frame of a variant chosen for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum FrameSlot {
    /// The variant's static two-line text.
    Static,
    /// Index into the variant's animation frames.
    Animated(usize),
}

impl FrameSlot {
    /// Numeric index as exposed through `%motd_frame%`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Static => 0,
            Self::Animated(index) => index,
        }
    }

    /// Template text of this slot for `variant`.
    #[must_use]
    pub fn template(self, variant: &Variant) -> &str {
        match self {
            Self::Animated(index) => variant
                .frames
                .get(index)
                .map_or(variant.motd.as_str(), String::as_str),
            Self::Static => variant.motd.as_str(),
        }
    }
}

/// Frame seed recorded for a sticky entry created at `now_ms`.
#[must_use]
pub const fn frame_seed_for(now_ms: u64, frame_interval_ms: u64) -> u64 {
    if frame_interval_ms == 0 {
        return now_ms;
    }
    now_ms / frame_interval_ms
}

/// Resolve the frame to render.
///
/// Per-origin scope with a seeded sticky entry pins the phase to the entry;
/// everything else follows the shared wall clock.
#[must_use]
pub fn frame_slot(
    group: &Group,
    variant: &Variant,
    sticky: Option<&StickyEntry>,
    now_ms: u64,
) -> FrameSlot {
    let animation = &group.animation;
    if !animation.enabled || !variant.is_animated() {
        return FrameSlot::Static;
    }
    let count = variant.frames.len();

    if animation.scope == FrameScope::PerOrigin
        && let Some(seed) = sticky.and_then(|entry| entry.frame_seed.value())
    {
        return FrameSlot::Animated(index_mod(seed, count));
    }

    let tick = frame_seed_for(now_ms, animation.frame_interval_ms);
    FrameSlot::Animated(index_mod(tick, count))
}
