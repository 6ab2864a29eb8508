//! Render cache and placeholder substitution.
use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::animation::FrameSlot;
use crate::data::{Settings, Snapshot, Variant};
use crate::format::{self, DialectPreference, ParseResult};

static PLACEHOLDER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"%(online|max|version|preset|profile|motd_frame|time)%").ok());

/// One frame template with its parse result cached when it is static.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub raw: String,
    pub has_placeholders: bool,
    /// Present only for templates without placeholders.
    pub parsed: Option<ParseResult>,
}

impl RenderedFrame {
    fn build(raw: &str, placeholders_enabled: bool, dialect: DialectPreference) -> Self {
        let has_placeholders = placeholders_enabled && contains_placeholder(raw);
        Self {
            raw: raw.to_string(),
            has_placeholders,
            parsed: (!has_placeholders).then(|| format::parse(raw, dialect)),
        }
    }

    /// Parse result for this request, substituting placeholders if needed.
    #[must_use]
    pub fn resolve(
        &self,
        values: &PlaceholderValues<'_>,
        dialect: DialectPreference,
    ) -> ParseResult {
        match &self.parsed {
            Some(parsed) => parsed.clone(),
            None => format::parse(&substitute(&self.raw, values), dialect),
        }
    }
}

/// Per-request values for placeholder tokens.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderValues<'a> {
    pub online: u32,
    pub max: u32,
    pub version: &'a str,
    pub variant_id: &'a str,
    pub group_id: &'a str,
    pub frame: usize,
    pub now_ms: u64,
}

#[must_use]
pub fn contains_placeholder(raw: &str) -> bool {
    PLACEHOLDER.as_ref().is_some_and(|re| re.is_match(raw))
}

/// Replace every recognised `%token%`. Unknown tokens stay literal.
#[must_use]
pub fn substitute<'t>(template: &'t str, values: &PlaceholderValues<'_>) -> Cow<'t, str> {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return Cow::Borrowed(template);
    };
    re.replace_all(template, |caps: &Captures<'_>| match &caps[1] {
        "online" => values.online.to_string(),
        "max" => values.max.to_string(),
        "version" => values.version.to_string(),
        "preset" => values.variant_id.to_string(),
        "profile" => values.group_id.to_string(),
        "motd_frame" => values.frame.to_string(),
        "time" => clock_time(values.now_ms),
        other => format!("%{other}%"),
    })
}

fn clock_time(now_ms: u64) -> String {
    i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| "00:00:00".to_string(), |at| at.format("%H:%M:%S").to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FrameKey {
    group: usize,
    variant: usize,
    slot: FrameSlot,
}

/// Lazily filled cache of frames keyed by (group, variant, frame slot).
#[derive(Debug)]
pub struct RenderCache {
    frames: DashMap<FrameKey, Arc<RenderedFrame>>,
    fallbacks: DashSet<(usize, usize, DialectPreference)>,
    placeholders_enabled: bool,
    dialect: DialectPreference,
}

impl RenderCache {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            frames: DashMap::new(),
            fallbacks: DashSet::new(),
            placeholders_enabled: settings.placeholders_enabled,
            dialect: settings.dialect,
        }
    }

    /// Build every frame of every variant up front.
    pub fn warm(&self, snapshot: &Snapshot) {
        for (group_idx, group) in snapshot.groups().iter().enumerate() {
            for variant in &group.variants {
                self.frame(group_idx, variant, FrameSlot::Static);
                for index in 0..variant.frames.len() {
                    self.frame(group_idx, variant, FrameSlot::Animated(index));
                }
            }
        }
    }

    #[must_use]
    pub const fn dialect(&self) -> DialectPreference {
        self.dialect
    }

    pub fn frame(
        &self,
        group_idx: usize,
        variant: &Variant,
        slot: FrameSlot,
    ) -> Arc<RenderedFrame> {
        let key = FrameKey {
            group: group_idx,
            variant: variant.ordinal(),
            slot,
        };
        if let Some(hit) = self.frames.get(&key) {
            return Arc::clone(hit.value());
        }
        let built = Arc::new(RenderedFrame::build(
            slot.template(variant),
            self.placeholders_enabled,
            self.dialect,
        ));
        Arc::clone(self.frames.entry(key).or_insert(built).value())
    }

    /// Log a parse fallback at most once per (group, variant, dialect).
    pub fn note_fallback(&self, group_idx: usize, group_id: &str, variant: &Variant) {
        if self
            .fallbacks
            .insert((group_idx, variant.ordinal(), self.dialect))
        {
            log::warn!(
                "MOTD of preset '{}' in profile '{group_id}' could not be parsed as {:?}; showing plain text",
                variant.id,
                self.dialect
            );
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Group, SelectionStrategy};
    use crate::format::Dialect;

    fn values() -> PlaceholderValues<'static> {
        PlaceholderValues {
            online: 12,
            max: 100,
            version: "1.21.x",
            variant_id: "spring",
            group_id: "lobby",
            frame: 2,
            now_ms: 3_723_000,
        }
    }

    #[test]
    fn substitutes_known_tokens_only() {
        let out = substitute(
            "%online%/%max% %version% %preset%@%profile% #%motd_frame% %time% %unknown%",
            &values(),
        );
        assert_eq!(out, "12/100 1.21.x spring@lobby #2 01:02:03 %unknown%");
    }

    #[test]
    fn static_templates_are_parsed_once() {
        let settings = Settings::default();
        let cache = RenderCache::new(&settings);
        let snapshot = Snapshot::from_groups(
            settings,
            vec![Group::new(
                "g",
                SelectionStrategy::Random,
                vec![Variant::new("v", 1, "<red>Hi").with_frames(["%online% on"])],
            )],
        );
        cache.warm(&snapshot);
        assert_eq!(cache.len(), 2);

        let variant = &snapshot.groups()[0].variants[0];
        let still = cache.frame(0, variant, FrameSlot::Static);
        assert!(!still.has_placeholders);
        assert_eq!(still.parsed.as_ref().map(|p| p.dialect), Some(Dialect::TagMarkup));

        let live = cache.frame(0, variant, FrameSlot::Animated(0));
        assert!(live.has_placeholders && live.parsed.is_none());
        let resolved = live.resolve(&values(), cache.dialect());
        assert_eq!(resolved.rich.to_plain(), "12 on");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn disabled_placeholders_stay_literal_and_cached() {
        let settings = Settings {
            placeholders_enabled: false,
            ..Settings::default()
        };
        let cache = RenderCache::new(&settings);
        let variant = Variant::new("v", 1, "%online% players");
        let frame = cache.frame(0, &variant, FrameSlot::Static);
        assert!(!frame.has_placeholders);
        let resolved = frame.resolve(&values(), cache.dialect());
        assert_eq!(resolved.rich.to_plain(), "%online% players");
    }
}
