//! Centralized defaults and tuning constants for the rendering engine.
//!
//! Configuration that is missing or out of range is replaced by these values
//! during snapshot normalization, so every substitution is traceable to one
//! place.

// Group defaults -----------------------------------------------------------
pub(crate) const DEFAULT_GROUP_ID: &str = "default";
pub(crate) const DEFAULT_STICKY_TTL_SECS: i64 = 10;
pub(crate) const DEFAULT_STICKY_CAPACITY: i64 = 10_000;
pub(crate) const DEFAULT_CLEANUP_EVERY: i64 = 500;

// Animation ----------------------------------------------------------------
pub(crate) const DEFAULT_FRAME_INTERVAL_MS: i64 = 450;
pub(crate) const MIN_FRAME_INTERVAL_MS: i64 = 100;

// Sticky maintenance -------------------------------------------------------
/// Upper bound on entries inspected or removed by each maintenance tier.
pub const MAINTENANCE_BATCH: usize = 200;

// Player counts ------------------------------------------------------------
/// Width of the time bucket that keeps seeded fake-player counts stable.
pub(crate) const FAKE_PLAYER_BUCKET_MS: u64 = 60_000;

// Fallback content ---------------------------------------------------------
pub(crate) const FALLBACK_VARIANT_ID: &str = "default";
pub(crate) const FALLBACK_MOTD: &str =
    "<gray>A Minecraft Server</gray>\n<dark_gray>Status unavailable</dark_gray>";
pub(crate) const FALLBACK_VERSION_LABEL: &str = "1.21.x";
pub(crate) const MAX_FRAME_LINES: usize = 2;

// Hash domains -------------------------------------------------------------
pub(crate) const HASH_DOMAIN_ORIGIN: u64 = 0x6f72_6967_696e_0001;
pub(crate) const HASH_DOMAIN_STICKY: u64 = 0x7374_6963_6b79_0002;
pub(crate) const HASH_DOMAIN_FAKE_PLAYERS: u64 = 0x6661_6b65_7073_0003;
