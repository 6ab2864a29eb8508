//! Configuration snapshot: the raw serde model handed over by the loading
//! collaborator and the validated, immutable form the engine reads.
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{
    DEFAULT_CLEANUP_EVERY, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_GROUP_ID, DEFAULT_STICKY_CAPACITY,
    DEFAULT_STICKY_TTL_SECS, FALLBACK_MOTD, FALLBACK_VARIANT_ID, FALLBACK_VERSION_LABEL,
    MAX_FRAME_LINES, MIN_FRAME_INTERVAL_MS,
};
use crate::format::DialectPreference;
use crate::numbers::clamp_i64_to_u32;
use crate::routing::normalize_host;
use crate::weighted::Weighted;

/// Errors raised while reading a raw configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// Raw configuration -----------------------------------------------------------

/// Configuration tree as produced by the loading collaborator.
///
/// Every field is optional; normalization in [`Snapshot::from_config`]
/// substitutes defaults and records a warning for each defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub placeholders: PlaceholderConfig,
    #[serde(default)]
    pub color_format: Option<String>,
    #[serde(default)]
    pub default_icon: Option<String>,
    #[serde(default)]
    pub version_label: Option<String>,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub profiles: Option<Vec<GroupConfig>>,
    /// Legacy layout: presets at the root instead of inside profiles.
    #[serde(default)]
    pub presets: Option<Vec<VariantConfig>>,
}

impl SnapshotConfig {
    /// Load a configuration tree from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into the configuration shape.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DebugConfig {
    #[serde(default)]
    pub self_test: bool,
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoutingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GroupConfig {
    pub id: String,
    #[serde(default)]
    pub selection_mode: Option<String>,
    #[serde(default)]
    pub sticky_ttl_seconds: Option<i64>,
    #[serde(default)]
    pub sticky_max_entries: Option<i64>,
    #[serde(default)]
    pub sticky_cleanup_every: Option<i64>,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub player_count: PlayerCountConfig,
    #[serde(default)]
    pub presets: Vec<VariantConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnimationConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub frame_interval_millis: Option<i64>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerCountConfig {
    #[serde(default)]
    pub disable_hover: bool,
    #[serde(default)]
    pub hide_player_count: bool,
    #[serde(default)]
    pub fake_players: FakePlayersConfig,
    #[serde(default)]
    pub just_x_more: ToggleValueConfig,
    #[serde(default)]
    pub max_players: ToggleValueConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FakePlayersConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mode: Option<String>,
    /// `5`, `"3-8"`, `"3:8"` or `"50%"` depending on the mode.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ToggleValueConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VariantConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub motd: Vec<String>,
    #[serde(default)]
    pub motd_frames: Vec<String>,
}

const fn default_true() -> bool {
    true
}

// Validated model -------------------------------------------------------------

/// How a group picks a variant for each probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    Random,
    StickyPerOrigin,
    HashedPerOrigin,
    Rotate,
}

impl SelectionStrategy {
    /// Parse a strategy name, case-insensitively. Accepts the `_ip` spellings.
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "random" => Some(Self::Random),
            "sticky_per_ip" | "sticky_per_origin" | "sticky" => Some(Self::StickyPerOrigin),
            "hashed_per_ip" | "hashed_per_origin" | "hashed" => Some(Self::HashedPerOrigin),
            "rotate" | "rotation" => Some(Self::Rotate),
            _ => None,
        }
    }
}

/// Where the animation phase comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameScope {
    /// Shared wall-clock phase for every caller.
    Global,
    /// Phase pinned per origin by its sticky frame seed.
    PerOrigin,
}

impl FrameScope {
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "global" => Some(Self::Global),
            "per_ip_sticky" | "per_origin" | "per_origin_sticky" => Some(Self::PerOrigin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationPolicy {
    pub enabled: bool,
    pub frame_interval_ms: u64,
    pub scope: FrameScope,
}

impl Default for AnimationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS.unsigned_abs(),
            scope: FrameScope::Global,
        }
    }
}

impl AnimationPolicy {
    /// Animation policy with the interval clamped to the supported minimum.
    #[must_use]
    pub fn new(enabled: bool, frame_interval_ms: u64, scope: FrameScope) -> Self {
        Self {
            enabled,
            frame_interval_ms: frame_interval_ms.max(MIN_FRAME_INTERVAL_MS.unsigned_abs()),
            scope,
        }
    }

    #[must_use]
    pub fn per_origin(&self) -> bool {
        self.enabled && self.scope == FrameScope::PerOrigin
    }
}

/// Fake-player delta added on top of the real online count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum FakePlayers {
    #[default]
    Off,
    Static { count: u32 },
    Range { min: u32, max: u32 },
    Percent { percent: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerCountPolicy {
    pub disable_hover: bool,
    pub hide_player_count: bool,
    pub fake_players: FakePlayers,
    /// Report max slots as `online + x`.
    pub just_x_more: Option<u32>,
    /// Report a fixed max slot count; wins over `just_x_more`.
    pub max_players: Option<u32>,
}

/// One selectable content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub id: String,
    pub weight: u32,
    pub icon: Option<String>,
    /// Static frame shown when animation is off or no frames exist.
    pub motd: String,
    /// Animation frames, each at most two lines.
    pub frames: SmallVec<[String; 4]>,
    #[serde(skip)]
    ordinal: usize,
}

impl Variant {
    /// Create a variant from a static template; lines beyond two are dropped.
    #[must_use]
    pub fn new(id: impl Into<String>, weight: u32, motd: &str) -> Self {
        Self {
            id: id.into(),
            weight: weight.max(1),
            icon: None,
            motd: normalize_frame(motd).0,
            frames: SmallVec::new(),
            ordinal: 0,
        }
    }

    #[must_use]
    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.frames = frames
            .into_iter()
            .map(|frame| normalize_frame(frame.as_ref()).0)
            .collect();
        self
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Built-in variant substituted when a group has nothing usable.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(FALLBACK_VARIANT_ID, 1, FALLBACK_MOTD)
    }

    /// Position of this variant inside its group.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    #[must_use]
    pub fn is_animated(&self) -> bool {
        !self.frames.is_empty()
    }
}

impl Weighted for Variant {
    fn weight(&self) -> u32 {
        self.weight
    }
}

/// Named configuration bundle with its own strategy and variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub strategy: SelectionStrategy,
    pub sticky_ttl_ms: u64,
    pub sticky_capacity: usize,
    pub cleanup_every: u64,
    pub animation: AnimationPolicy,
    pub player_count: PlayerCountPolicy,
    pub variants: Vec<Arc<Variant>>,
}

impl Group {
    /// Create a group with default sticky, animation and count policies.
    ///
    /// An empty variant list is replaced by [`Variant::fallback`].
    #[must_use]
    pub fn new(id: impl Into<String>, strategy: SelectionStrategy, variants: Vec<Variant>) -> Self {
        let variants = if variants.is_empty() {
            vec![Variant::fallback()]
        } else {
            variants
        };
        Self {
            id: id.into(),
            strategy,
            sticky_ttl_ms: DEFAULT_STICKY_TTL_SECS.unsigned_abs() * 1_000,
            sticky_capacity: usize::try_from(DEFAULT_STICKY_CAPACITY).unwrap_or(10_000),
            cleanup_every: DEFAULT_CLEANUP_EVERY.unsigned_abs(),
            animation: AnimationPolicy::default(),
            player_count: PlayerCountPolicy::default(),
            variants: variants
                .into_iter()
                .enumerate()
                .map(|(ordinal, mut variant)| {
                    variant.ordinal = ordinal;
                    Arc::new(variant)
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn with_sticky(mut self, ttl_secs: u32, capacity: usize, cleanup_every: u64) -> Self {
        self.sticky_ttl_ms = u64::from(ttl_secs.max(1)) * 1_000;
        self.sticky_capacity = capacity.max(1);
        self.cleanup_every = cleanup_every.max(1);
        self
    }

    #[must_use]
    pub const fn with_animation(mut self, animation: AnimationPolicy) -> Self {
        self.animation = animation;
        self
    }

    #[must_use]
    pub const fn with_player_count(mut self, player_count: PlayerCountPolicy) -> Self {
        self.player_count = player_count;
        self
    }

    #[must_use]
    pub fn variant(&self, id: &str) -> Option<&Arc<Variant>> {
        self.variants.iter().find(|variant| variant.id == id)
    }

    #[must_use]
    pub fn uses_fallback(&self) -> bool {
        self.variants.len() == 1 && self.variants[0].id == FALLBACK_VARIANT_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Routing {
    pub enabled: bool,
    /// Virtual host, as produced by `normalize_host`, to group id.
    pub host_map: HashMap<String, String>,
}

/// Global settings shared by every group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub placeholders_enabled: bool,
    pub default_icon: Option<String>,
    pub dialect: DialectPreference,
    pub version_label: String,
    pub debug_self_test: bool,
    pub debug_verbose: bool,
    pub active_group: String,
    pub routing: Routing,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            placeholders_enabled: true,
            default_icon: None,
            dialect: DialectPreference::Auto,
            version_label: FALLBACK_VERSION_LABEL.to_string(),
            debug_self_test: false,
            debug_verbose: false,
            active_group: DEFAULT_GROUP_ID.to_string(),
            routing: Routing::default(),
        }
    }
}

/// Immutable configuration snapshot published to the engine on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub settings: Settings,
    groups: Vec<Arc<Group>>,
    index: HashMap<String, usize>,
    warnings: Vec<String>,
}

impl Snapshot {
    /// Assemble a snapshot from already validated groups.
    ///
    /// An empty group list is replaced by a single fallback group, and an
    /// active group that does not exist is redirected to the first group.
    #[must_use]
    pub fn from_groups(settings: Settings, groups: Vec<Group>) -> Self {
        let mut warnings = Warnings::default();
        Self::assemble(settings, groups, &mut warnings)
    }

    /// Normalize a raw configuration tree, substituting documented defaults
    /// for every defect and recording a warning for each substitution.
    #[must_use]
    pub fn from_config(config: SnapshotConfig) -> Self {
        let mut warnings = Warnings::default();

        let dialect = match config.color_format.as_deref() {
            None => DialectPreference::Auto,
            Some(raw) => DialectPreference::from_name(raw).unwrap_or_else(|| {
                warnings.push(format!("Unknown color_format '{raw}'. Using AUTO."));
                DialectPreference::Auto
            }),
        };

        let groups = match (config.profiles, config.presets) {
            (Some(profiles), _) => profiles
                .into_iter()
                .map(|group| normalize_group(group, &mut warnings))
                .collect(),
            (None, Some(presets)) => {
                warnings.push(
                    "Legacy config detected (root presets). Migrate to the profiles layout."
                        .to_string(),
                );
                let legacy = GroupConfig {
                    id: DEFAULT_GROUP_ID.to_string(),
                    presets,
                    ..GroupConfig::default()
                };
                vec![normalize_group(legacy, &mut warnings)]
            }
            (None, None) => Vec::new(),
        };

        let host_map = config
            .routing
            .host_map
            .into_iter()
            .filter(|(_, group)| !group.trim().is_empty())
            .map(|(host, group)| (normalize_host(&host), group))
            .collect();

        let settings = Settings {
            placeholders_enabled: config.placeholders.enabled,
            default_icon: config.default_icon.filter(|icon| !icon.trim().is_empty()),
            dialect,
            version_label: config
                .version_label
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_VERSION_LABEL.to_string()),
            debug_self_test: config.debug.self_test,
            debug_verbose: config.debug.verbose,
            active_group: config
                .active_profile
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GROUP_ID.to_string()),
            routing: Routing {
                enabled: config.routing.enabled,
                host_map,
            },
        };

        Self::assemble(settings, groups, &mut warnings)
    }

    fn assemble(mut settings: Settings, groups: Vec<Group>, warnings: &mut Warnings) -> Self {
        let mut groups: Vec<Arc<Group>> = groups.into_iter().map(Arc::new).collect();
        if groups.is_empty() {
            warnings.push("No profiles found. Using built-in fallback profile.".to_string());
            groups.push(Arc::new(Group::new(
                DEFAULT_GROUP_ID,
                SelectionStrategy::StickyPerOrigin,
                Vec::new(),
            )));
        }

        let mut index = HashMap::with_capacity(groups.len());
        let mut unique = Vec::with_capacity(groups.len());
        for group in groups {
            if index.contains_key(&group.id) {
                warnings.push(format!("Duplicate profile '{}'. Keeping the first.", group.id));
                continue;
            }
            index.insert(group.id.clone(), unique.len());
            unique.push(group);
        }

        if !index.contains_key(&settings.active_group) {
            let fallback = unique[0].id.clone();
            warnings.push(format!(
                "Active profile '{}' not found. Using '{fallback}'.",
                settings.active_group
            ));
            settings.active_group = fallback;
        }

        for (host, group) in &settings.routing.host_map {
            if !index.contains_key(group) {
                warnings.push(format!(
                    "routing.host_map entry '{host}' points to missing profile '{group}'."
                ));
            }
        }

        Self {
            settings,
            groups: unique,
            index,
            warnings: warnings.take(),
        }
    }

    #[must_use]
    pub fn groups(&self) -> &[Arc<Group>] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Arc<Group>> {
        self.index.get(id).map(|idx| &self.groups[*idx])
    }

    #[must_use]
    pub fn group_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Group used when no routing rule applies.
    #[must_use]
    pub fn active_group(&self) -> &Arc<Group> {
        self.group(&self.settings.active_group)
            .unwrap_or(&self.groups[0])
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.groups.iter().map(|group| group.variants.len()).sum()
    }

    /// Defects found while normalizing the configuration.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::from_groups(Settings::default(), Vec::new())
    }
}

#[derive(Debug, Default)]
struct Warnings(Vec<String>);

impl Warnings {
    fn push(&mut self, message: String) {
        log::warn!("{message}");
        self.0.push(message);
    }

    fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }
}

/// Keep at most two lines of a frame; reports whether lines were dropped.
fn normalize_frame(raw: &str) -> (String, bool) {
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() <= MAX_FRAME_LINES {
        return (raw.to_string(), false);
    }
    (lines[..MAX_FRAME_LINES].join("\n"), true)
}

fn clamp_setting(
    value: Option<i64>,
    default: i64,
    min: i64,
    field: &str,
    group: &str,
    warnings: &mut Warnings,
) -> u64 {
    let value = value.unwrap_or(default);
    if value < min {
        warnings.push(format!(
            "{field} in profile '{group}' must be >= {min}. Using {min}."
        ));
        return min.unsigned_abs();
    }
    value.unsigned_abs()
}

fn normalize_group(config: GroupConfig, warnings: &mut Warnings) -> Group {
    let id = config.id;

    let strategy = match config.selection_mode.as_deref() {
        None => SelectionStrategy::StickyPerOrigin,
        Some(raw) => SelectionStrategy::from_name(raw).unwrap_or_else(|| {
            warnings.push(format!(
                "Unknown selection_mode '{raw}' in profile '{id}'. Using STICKY_PER_IP."
            ));
            SelectionStrategy::StickyPerOrigin
        }),
    };

    let ttl_secs = clamp_setting(
        config.sticky_ttl_seconds,
        DEFAULT_STICKY_TTL_SECS,
        1,
        "sticky_ttl_seconds",
        &id,
        warnings,
    );
    let capacity = clamp_setting(
        config.sticky_max_entries,
        DEFAULT_STICKY_CAPACITY,
        1,
        "sticky_max_entries",
        &id,
        warnings,
    );
    let cleanup_every = clamp_setting(
        config.sticky_cleanup_every,
        DEFAULT_CLEANUP_EVERY,
        1,
        "sticky_cleanup_every",
        &id,
        warnings,
    );

    let interval = clamp_setting(
        config.animation.frame_interval_millis,
        DEFAULT_FRAME_INTERVAL_MS,
        MIN_FRAME_INTERVAL_MS,
        "animation.frame_interval_millis",
        &id,
        warnings,
    );
    let scope = match config.animation.mode.as_deref() {
        None => FrameScope::Global,
        Some(raw) => FrameScope::from_name(raw).unwrap_or_else(|| {
            warnings.push(format!(
                "Unknown animation.mode '{raw}' in profile '{id}'. Using GLOBAL."
            ));
            FrameScope::Global
        }),
    };
    let animation = AnimationPolicy::new(config.animation.enabled.unwrap_or(true), interval, scope);
    let player_count = normalize_player_count(config.player_count, &id, warnings);

    let variants: Vec<Variant> = config
        .presets
        .into_iter()
        .filter_map(|variant| normalize_variant(variant, &id, warnings))
        .collect();
    if variants.is_empty() {
        warnings.push(format!(
            "Profile '{id}' has no valid presets. Using fallback preset."
        ));
    }

    let mut group = Group::new(id, strategy, variants)
        .with_animation(animation)
        .with_player_count(player_count);
    group.sticky_ttl_ms = ttl_secs.saturating_mul(1_000);
    group.sticky_capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
    group.cleanup_every = cleanup_every;
    group
}

fn normalize_player_count(
    config: PlayerCountConfig,
    group: &str,
    warnings: &mut Warnings,
) -> PlayerCountPolicy {
    let just_x_more = config.just_x_more.enabled.then(|| {
        if config.just_x_more.value < 0 {
            warnings.push(format!(
                "just_x_more.value in profile '{group}' must be >= 0. Using 0."
            ));
        }
        clamp_i64_to_u32(config.just_x_more.value, 0)
    });
    let max_players = config.max_players.enabled.then(|| {
        if config.max_players.value < 1 {
            warnings.push(format!(
                "max_players.value in profile '{group}' must be >= 1. Using 1."
            ));
        }
        clamp_i64_to_u32(config.max_players.value, 1)
    });

    PlayerCountPolicy {
        disable_hover: config.disable_hover,
        hide_player_count: config.hide_player_count,
        fake_players: normalize_fake_players(&config.fake_players, group, warnings),
        just_x_more,
        max_players,
    }
}

fn scalar_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(text)) => text.trim().to_string(),
        Some(serde_json::Value::Number(number)) => number.to_string(),
        _ => "0".to_string(),
    }
}

fn parse_int(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

fn normalize_fake_players(
    config: &FakePlayersConfig,
    group: &str,
    warnings: &mut Warnings,
) -> FakePlayers {
    if !config.enabled {
        return FakePlayers::Off;
    }
    let mode = config
        .mode
        .as_deref()
        .map_or_else(|| "static".to_string(), |raw| raw.trim().to_ascii_lowercase());
    let raw = scalar_text(config.value.as_ref());

    match mode.as_str() {
        "percent" => {
            let percent = raw.trim_end_matches('%').trim().parse::<f64>().unwrap_or(0.0);
            if percent < 0.0 || !percent.is_finite() {
                warnings.push(format!(
                    "fake_players.value in profile '{group}' must be >= 0. Using 0."
                ));
                return FakePlayers::Percent { percent: 0.0 };
            }
            FakePlayers::Percent { percent }
        }
        "random" => {
            let (low, high) = match raw.split_once(['-', ':']) {
                Some((low, high)) if !low.trim().is_empty() => (parse_int(low), parse_int(high)),
                _ => (parse_int(&raw), parse_int(&raw)),
            };
            let min = clamp_i64_to_u32(low, 0);
            let max = clamp_i64_to_u32(high, 0).max(min);
            FakePlayers::Range { min, max }
        }
        other => {
            if other != "static" {
                warnings.push(format!(
                    "Unknown fake_players.mode '{other}' in profile '{group}'. Using static."
                ));
            }
            FakePlayers::Static {
                count: clamp_i64_to_u32(parse_int(&raw), 0),
            }
        }
    }
}

fn join_lines(lines: &[String]) -> String {
    lines
        .iter()
        .take(MAX_FRAME_LINES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_variant(
    config: VariantConfig,
    group: &str,
    warnings: &mut Warnings,
) -> Option<Variant> {
    let Some(id) = config.id.filter(|id| !id.trim().is_empty()) else {
        warnings.push(format!(
            "Preset entry missing id in profile '{group}'. Skipping."
        ));
        return None;
    };

    let weight = config.weight.unwrap_or(1);
    if weight < 1 {
        warnings.push(format!(
            "Preset '{id}' in profile '{group}' has weight < 1. Using 1."
        ));
    }

    if config.motd.len() > MAX_FRAME_LINES {
        warnings.push(format!(
            "Preset '{id}' in profile '{group}' motd has more than 2 lines. Using first two."
        ));
    }
    let (motd, truncated) = normalize_frame(&join_lines(&config.motd));
    if truncated {
        warnings.push(format!(
            "Preset '{id}' in profile '{group}' motd has more than 2 lines. Using first two."
        ));
    }

    let mut frames: SmallVec<[String; 4]> = SmallVec::with_capacity(config.motd_frames.len());
    for (index, frame) in config.motd_frames.iter().enumerate() {
        let (normalized, truncated) = normalize_frame(frame);
        if truncated {
            warnings.push(format!(
                "Preset '{id}' in profile '{group}' frame {index} has more than 2 lines. Using first two."
            ));
        }
        frames.push(normalized);
    }

    if config.motd.is_empty() && frames.is_empty() {
        warnings.push(format!(
            "Preset '{id}' in profile '{group}' has no motd or motd_frames. Skipping."
        ));
        return None;
    }

    let motd = if config.motd.is_empty() {
        frames.first().cloned().unwrap_or_default()
    } else {
        motd
    };

    Some(Variant {
        id,
        weight: clamp_i64_to_u32(weight, 1),
        icon: config.icon.filter(|icon| !icon.trim().is_empty()),
        motd,
        frames,
        ordinal: 0,
    })
}
