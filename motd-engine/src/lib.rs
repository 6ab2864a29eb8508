//! MOTD Engine
//!
//! Platform-agnostic server status rendering: variant selection, sticky
//! per-origin state, animation frames, player counts and rich-text
//! formatting. Hosts feed probes in and get render results back; the crate
//! performs no I/O of its own.

pub mod animation;
pub mod constants;
pub mod data;
pub mod engine;
pub mod format;
pub mod host;
pub mod numbers;
pub mod players;
pub mod render;
pub mod richtext;
pub mod routing;
pub mod seed;
pub mod selection;
pub mod sticky;
pub mod weighted;

// Re-export commonly used types
pub use animation::{FrameSlot, frame_slot};
pub use data::{
    AnimationPolicy, ConfigError, FakePlayers, FrameScope, Group, PlayerCountPolicy, Routing,
    SelectionStrategy, Settings, Snapshot, SnapshotConfig, Variant,
};
pub use engine::{MotdEngine, Probe, ReloadSummary, RenderResult, StatEntry};
pub use format::{Dialect, DialectPreference, ParseError, ParseResult, parse};
pub use host::{HostAdapter, HostCapabilities, HostDirectives, IconSource, MotdPayload};
pub use players::PlayerCounts;
pub use richtext::{Color, NamedColor, RichText, Span, Style};
pub use selection::{GroupState, SelectMode, Selection, SelectionReason, select};
pub use sticky::{FrameSeed, MaintenanceReport, StickyEntry, StickyStore};
pub use weighted::{ChoiceError, Weighted, pick};

/// Trait for abstracting configuration loading
/// Host-specific implementations read and deserialize their own files
pub trait SnapshotSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce a fresh, normalized snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_snapshot(&self) -> Result<Snapshot, Self::Error>;
}

/// Snapshot source backed by an in-memory JSON document
#[derive(Debug, Clone)]
pub struct JsonSource {
    json: String,
}

impl JsonSource {
    #[must_use]
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl SnapshotSource for JsonSource {
    type Error = ConfigError;

    fn load_snapshot(&self) -> Result<Snapshot, Self::Error> {
        Ok(Snapshot::from_config(SnapshotConfig::from_json(&self.json)?))
    }
}
