//! Markup dialect detection and the parse cascade.
//!
//! Each dialect is a pure `fn(&str) -> Result<RichText, ParseError>`; the
//! resolver walks an ordered attempt list and keeps the first success.
mod effects;
mod json;
mod legacy;
mod minimessage;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::richtext::RichText;

/// Markup dialects in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    TagMarkup,
    LegacyCodes,
    HexLegacy,
    Json,
    Plain,
}

impl Dialect {
    pub const MARKUP: [Self; 4] = [Self::TagMarkup, Self::LegacyCodes, Self::HexLegacy, Self::Json];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TagMarkup => "minimessage",
            Self::LegacyCodes => "legacy",
            Self::HexLegacy => "hex",
            Self::Json => "json",
            Self::Plain => "plain",
        }
    }

    fn parser(self) -> fn(&str) -> Result<RichText, ParseError> {
        match self {
            Self::TagMarkup => minimessage::parse,
            Self::LegacyCodes => legacy::parse_legacy,
            Self::HexLegacy => legacy::parse_hex,
            Self::Json => json::parse,
            Self::Plain => parse_plain,
        }
    }

    fn appears_in(self, raw: &str) -> bool {
        match self {
            Self::TagMarkup => marker(&TAG_MARKER, raw),
            Self::LegacyCodes => marker(&LEGACY_MARKER, raw),
            Self::HexLegacy => marker(&HEX_MARKER, raw),
            Self::Json => {
                let trimmed = raw.trim_start();
                trimmed.starts_with('{') || trimmed.starts_with('[')
            }
            Self::Plain => true,
        }
    }
}

/// Configured `color_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "dialect")]
pub enum DialectPreference {
    #[default]
    Auto,
    Fixed(Dialect),
}

impl DialectPreference {
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        let dialect = match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => return Some(Self::Auto),
            "minimessage" | "mini_message" | "tag" | "tags" => Dialect::TagMarkup,
            "legacy" | "legacy_ampersand" | "legacy_section" => Dialect::LegacyCodes,
            "hex" | "legacy_hex" => Dialect::HexLegacy,
            "json" => Dialect::Json,
            "plain" => Dialect::Plain,
            _ => return None,
        };
        Some(Self::Fixed(dialect))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unclosed tag starting at byte {0}")]
    UnclosedTag(usize),
    #[error("unknown tag <{0}>")]
    UnknownTag(String),
    #[error("section sign legacy code at byte {0}")]
    SectionSign(usize),
    #[error("format code marker at end of input")]
    DanglingCode,
    #[error("unknown format code '{0}'")]
    UnknownCode(char),
    #[error("hex color sequence at byte {0} needs the hex dialect")]
    UnexpectedHex(usize),
    #[error("malformed hex color at byte {0}")]
    BadHex(usize),
    #[error("invalid component json: {0}")]
    Json(String),
    #[error("unsupported component: {0}")]
    Component(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Outcome of resolving one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub rich: RichText,
    pub dialect: Dialect,
    /// Every markup attempt failed and the raw text is shown as-is.
    pub fallback_used: bool,
}

static TAG_MARKER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"<[#/!a-zA-Z][^<>]*>").ok());
static LEGACY_MARKER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[&§][0-9a-fk-orA-FK-OR]").ok());
static HEX_MARKER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:&#[0-9a-fA-F]{6})|(?:[&§][xX](?:[&§][0-9a-fA-F]){6})").ok());

fn marker(pattern: &Lazy<Option<Regex>>, raw: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(raw))
}

/// Resolve `raw` into rich text. Never fails: the last resort is plain text.
#[must_use]
pub fn parse(raw: &str, preference: DialectPreference) -> ParseResult {
    let detected: SmallVec<[Dialect; 4]> = Dialect::MARKUP
        .into_iter()
        .filter(|dialect| dialect.appears_in(raw))
        .collect();

    let attempts: SmallVec<[Dialect; 4]> = match preference {
        DialectPreference::Auto => detected.clone(),
        DialectPreference::Fixed(first) => std::iter::once(first)
            .chain(detected.iter().copied().filter(|dialect| *dialect != first))
            .collect(),
    };

    for dialect in attempts {
        match (dialect.parser())(raw) {
            Ok(rich) => {
                return ParseResult {
                    rich,
                    dialect,
                    fallback_used: false,
                };
            }
            Err(err) => log::trace!("{} parse rejected template: {err}", dialect.name()),
        }
    }

    ParseResult {
        rich: RichText::plain(raw),
        dialect: Dialect::Plain,
        fallback_used: !detected.is_empty(),
    }
}

#[allow(clippy::unnecessary_wraps)]
fn parse_plain(raw: &str) -> Result<RichText, ParseError> {
    Ok(RichText::plain(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::{Color, NamedColor};

    #[test]
    fn plain_text_is_not_a_fallback() {
        let result = parse("Just words", DialectPreference::Auto);
        assert_eq!(result.dialect, Dialect::Plain);
        assert!(!result.fallback_used);
        assert_eq!(result.rich.to_plain(), "Just words");
    }

    #[test]
    fn auto_detects_each_dialect() {
        let cases = [
            ("<red>Hi</red>", Dialect::TagMarkup),
            ("&aHi", Dialect::LegacyCodes),
            ("&#ff0000Hi", Dialect::HexLegacy),
            (r#"{"text":"Hi","color":"red"}"#, Dialect::Json),
        ];
        for (raw, expected) in cases {
            let result = parse(raw, DialectPreference::Auto);
            assert_eq!(result.dialect, expected, "{raw}");
            assert_eq!(result.rich.to_plain(), "Hi", "{raw}");
            assert!(!result.fallback_used);
        }
    }

    #[test]
    fn hex_text_skips_plain_legacy() {
        let result = parse("&#00ff00Go &lnow", DialectPreference::Auto);
        assert_eq!(result.dialect, Dialect::HexLegacy);
        let spans = result.rich.spans();
        assert_eq!(spans[0].style.color, Some(Color::Rgb(0x00ff00)));
        assert!(spans[1].style.bold);
    }

    #[test]
    fn fixed_preference_tries_configured_dialect_first() {
        let raw = "&c<bold>Hi";
        let auto = parse(raw, DialectPreference::Auto);
        assert_eq!(auto.dialect, Dialect::TagMarkup);
        let fixed = parse(raw, DialectPreference::Fixed(Dialect::LegacyCodes));
        assert_eq!(fixed.dialect, Dialect::LegacyCodes);
        assert_eq!(
            fixed.rich.spans()[0].style.color,
            Some(Color::Named(NamedColor::Red))
        );
    }

    #[test]
    fn broken_markup_falls_back_to_plain() {
        for raw in ["<red>oops <b", "{not json", "&"] {
            let result = parse(raw, DialectPreference::Auto);
            assert_eq!(result.rich.to_plain(), raw);
            assert_eq!(result.dialect, Dialect::Plain);
        }
        assert!(parse("<red>oops <b", DialectPreference::Auto).fallback_used);
        assert!(parse("{not json", DialectPreference::Auto).fallback_used);
    }

    #[test]
    fn gradients_and_prose_brackets_parse_as_tag_markup() {
        for raw in [
            "<gradient:#ff0000:#0000ff>Welcome</gradient>",
            "<rainbow>Party time</rainbow>",
            "<green>We <3 players",
        ] {
            let result = parse(raw, DialectPreference::Auto);
            assert_eq!(result.dialect, Dialect::TagMarkup, "{raw}");
            assert!(!result.fallback_used, "{raw}");
            assert!(!result.rich.to_plain().contains("<gradient"), "{raw}");
        }
        let party = parse("<rainbow>Party time</rainbow>", DialectPreference::Auto);
        assert_eq!(party.rich.to_plain(), "Party time");
    }

    #[test]
    fn never_panics_on_edge_inputs() {
        for raw in ["", "<", ">", "&", "§", "\\", "[", "{", "<#>", "&#12", "</>", "<<>>"] {
            for preference in [
                DialectPreference::Auto,
                DialectPreference::Fixed(Dialect::Json),
                DialectPreference::Fixed(Dialect::TagMarkup),
            ] {
                let result = parse(raw, preference);
                assert!(result.rich.to_plain().len() <= raw.len());
            }
        }
    }

    #[test]
    fn preference_names() {
        assert_eq!(
            DialectPreference::from_name("MiniMessage"),
            Some(DialectPreference::Fixed(Dialect::TagMarkup))
        );
        assert_eq!(DialectPreference::from_name(" auto "), Some(DialectPreference::Auto));
        assert_eq!(DialectPreference::from_name("bbcode"), None);
    }
}
