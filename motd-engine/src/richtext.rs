//! Structured rich text produced by the format resolver.
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    pub const ALL: [Self; 16] = [
        Self::Black,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkAqua,
        Self::DarkRed,
        Self::DarkPurple,
        Self::Gold,
        Self::Gray,
        Self::DarkGray,
        Self::Blue,
        Self::Green,
        Self::Aqua,
        Self::Red,
        Self::LightPurple,
        Self::Yellow,
        Self::White,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::DarkBlue => "dark_blue",
            Self::DarkGreen => "dark_green",
            Self::DarkAqua => "dark_aqua",
            Self::DarkRed => "dark_red",
            Self::DarkPurple => "dark_purple",
            Self::Gold => "gold",
            Self::Gray => "gray",
            Self::DarkGray => "dark_gray",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Aqua => "aqua",
            Self::Red => "red",
            Self::LightPurple => "light_purple",
            Self::Yellow => "yellow",
            Self::White => "white",
        }
    }

    /// Legacy formatting code (`&a`, `§c`, ...).
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Black => '0',
            Self::DarkBlue => '1',
            Self::DarkGreen => '2',
            Self::DarkAqua => '3',
            Self::DarkRed => '4',
            Self::DarkPurple => '5',
            Self::Gold => '6',
            Self::Gray => '7',
            Self::DarkGray => '8',
            Self::Blue => '9',
            Self::Green => 'a',
            Self::Aqua => 'b',
            Self::Red => 'c',
            Self::LightPurple => 'd',
            Self::Yellow => 'e',
            Self::White => 'f',
        }
    }

    /// The color's standard 24-bit value.
    #[must_use]
    pub const fn rgb(self) -> u32 {
        match self {
            Self::Black => 0x00_0000,
            Self::DarkBlue => 0x00_00aa,
            Self::DarkGreen => 0x00_aa00,
            Self::DarkAqua => 0x00_aaaa,
            Self::DarkRed => 0xaa_0000,
            Self::DarkPurple => 0xaa_00aa,
            Self::Gold => 0xff_aa00,
            Self::Gray => 0xaa_aaaa,
            Self::DarkGray => 0x55_5555,
            Self::Blue => 0x55_55ff,
            Self::Green => 0x55_ff55,
            Self::Aqua => 0x55_ffff,
            Self::Red => 0xff_5555,
            Self::LightPurple => 0xff_55ff,
            Self::Yellow => 0xff_ff55,
            Self::White => 0xff_ffff,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let name = match name.as_str() {
            "grey" => "gray",
            "dark_grey" => "dark_gray",
            other => other,
        };
        Self::ALL.into_iter().find(|color| color.name() == name)
    }

    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        let code = code.to_ascii_lowercase();
        Self::ALL.into_iter().find(|color| color.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Named(NamedColor),
    Rgb(u32),
}

impl Color {
    /// Parse `#rrggbb`.
    #[must_use]
    pub fn from_hex(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::Rgb)
    }

    /// Parse a color name or `#rrggbb`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::from_hex(raw).or_else(|| NamedColor::from_name(raw).map(Self::Named))
    }

    #[must_use]
    pub const fn rgb(self) -> u32 {
        match self {
            Self::Named(named) => named.rgb(),
            Self::Rgb(rgb) => rgb,
        }
    }

    #[must_use]
    pub fn to_wire(self) -> String {
        match self {
            Self::Named(named) => named.name().to_string(),
            Self::Rgb(rgb) => format!("#{rgb:06x}"),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underlined: bool,
    pub strikethrough: bool,
    pub obfuscated: bool,
}

impl Style {
    /// A color change resets decorations, matching legacy code semantics.
    #[must_use]
    pub fn with_color(color: Color) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

/// Ordered list of styled spans. Line breaks are `\n` inside span text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RichText {
    spans: Vec<Span>,
}

impl RichText {
    #[must_use]
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Unformatted text as a single span.
    #[must_use]
    pub fn plain(text: &str) -> Self {
        let mut rich = Self::new();
        rich.push(text, Style::default());
        rich
    }

    /// Append text, merging with the previous span when the style matches.
    pub fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut()
            && last.style == style
        {
            last.text.push_str(text);
            return;
        }
        self.spans.push(Span {
            text: text.to_string(),
            style,
        });
    }

    /// Recolor every character from char offset `start` on with
    /// `paint(index, total)`. Line breaks keep their style and are not
    /// counted.
    pub fn paint_from(&mut self, start: usize, paint: impl Fn(usize, usize) -> Color) {
        let mut kept = Vec::with_capacity(self.spans.len());
        let mut tail: Vec<(char, Style)> = Vec::new();
        let mut seen = 0;
        for span in std::mem::take(&mut self.spans) {
            let len = span.text.chars().count();
            if seen + len <= start {
                seen += len;
                kept.push(span);
                continue;
            }
            let split = span
                .text
                .char_indices()
                .nth(start.saturating_sub(seen))
                .map_or(span.text.len(), |(at, _)| at);
            let (head, rest) = span.text.split_at(split);
            if !head.is_empty() {
                kept.push(Span {
                    text: head.to_string(),
                    style: span.style,
                });
            }
            tail.extend(rest.chars().map(|ch| (ch, span.style)));
            seen += len;
        }
        self.spans = kept;

        let total = tail.iter().filter(|(ch, _)| *ch != '\n').count();
        let mut index = 0;
        let mut buf = [0_u8; 4];
        for (ch, mut style) in tail {
            if ch != '\n' {
                style.color = Some(paint(index, total));
                index += 1;
            }
            self.push(ch.encode_utf8(&mut buf), style);
        }
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.spans.iter().map(|span| span.text.chars().count()).sum()
    }

    #[must_use]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Text with every bit of markup removed.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.to_plain().split('\n').map(str::to_string).collect()
    }

    /// Chat-component JSON for hosts that send rich text on the wire.
    #[must_use]
    pub fn to_component(&self) -> Value {
        let extra: Vec<Value> = self.spans.iter().map(span_component).collect();
        let mut root = Map::new();
        root.insert("text".to_string(), Value::String(String::new()));
        if !extra.is_empty() {
            root.insert("extra".to_string(), Value::Array(extra));
        }
        Value::Object(root)
    }
}

fn span_component(span: &Span) -> Value {
    let mut node = Map::new();
    node.insert("text".to_string(), Value::String(span.text.clone()));
    let style = span.style;
    if let Some(color) = style.color {
        node.insert("color".to_string(), Value::String(color.to_wire()));
    }
    for (key, on) in [
        ("bold", style.bold),
        ("italic", style.italic),
        ("underlined", style.underlined),
        ("strikethrough", style.strikethrough),
        ("obfuscated", style.obfuscated),
    ] {
        if on {
            node.insert(key.to_string(), Value::Bool(true));
        }
    }
    Value::Object(node)
}
