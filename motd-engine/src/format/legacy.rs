use super::ParseError;
use crate::richtext::{Color, NamedColor, RichText, Style};

pub(super) fn parse_legacy(raw: &str) -> Result<RichText, ParseError> {
    parse_codes(raw, false)
}

/// Legacy codes plus `&#rrggbb` and `&x&r&r&g&g&b&b` colors.
pub(super) fn parse_hex(raw: &str) -> Result<RichText, ParseError> {
    parse_codes(raw, true)
}

fn parse_codes(raw: &str, allow_hex: bool) -> Result<RichText, ParseError> {
    let mut out = RichText::new();
    let mut style = Style::default();
    let mut text = String::new();
    let mut chars = raw.char_indices().peekable();

    while let Some((at, ch)) = chars.next() {
        if ch != '&' && ch != '§' {
            text.push(ch);
            continue;
        }
        let Some(&(_, code)) = chars.peek() else {
            return Err(ParseError::DanglingCode);
        };

        let next = match code {
            '#' | 'x' | 'X' => match hex_sequence(&raw[at + ch.len_utf8()..]) {
                Some(_) if !allow_hex => return Err(ParseError::UnexpectedHex(at)),
                Some((color, len)) => {
                    let stop = at + ch.len_utf8() + len;
                    while chars.next_if(|(index, _)| *index < stop).is_some() {}
                    Style::with_color(color)
                }
                None if ch == '&' => {
                    text.push(ch);
                    continue;
                }
                None if !allow_hex => return Err(ParseError::UnexpectedHex(at)),
                None => return Err(ParseError::BadHex(at)),
            },
            other => match apply_code(other, style) {
                Some(next) => {
                    chars.next();
                    next
                }
                None if ch == '&' => {
                    text.push(ch);
                    continue;
                }
                None => return Err(ParseError::UnknownCode(other)),
            },
        };

        out.push(&text, style);
        text.clear();
        style = next;
    }
    out.push(&text, style);
    Ok(out)
}

/// A complete `#rrggbb` or `x&r&r&g&g&b&b` sequence at the start of `rest`,
/// with its length in bytes.
fn hex_sequence(rest: &str) -> Option<(Color, usize)> {
    if let Some(digits) = rest.strip_prefix('#') {
        return Some((hex_color(digits.get(..6)?)?, 7));
    }
    let mut chars = rest.char_indices();
    let Some((_, 'x' | 'X')) = chars.next() else {
        return None;
    };
    let mut digits = String::with_capacity(6);
    for _ in 0..6 {
        match (chars.next(), chars.next()) {
            (Some((_, '&' | '§')), Some((_, digit))) => digits.push(digit),
            _ => return None,
        }
    }
    let len = chars.next().map_or(rest.len(), |(end, _)| end);
    Some((hex_color(&digits)?, len))
}

fn hex_color(digits: &str) -> Option<Color> {
    Color::from_hex(&format!("#{digits}"))
}

fn apply_code(code: char, mut style: Style) -> Option<Style> {
    if let Some(color) = NamedColor::from_code(code) {
        return Some(Style::with_color(Color::Named(color)));
    }
    match code.to_ascii_lowercase() {
        'k' => style.obfuscated = true,
        'l' => style.bold = true,
        'm' => style.strikethrough = true,
        'n' => style.underlined = true,
        'o' => style.italic = true,
        'r' => style = Style::default(),
        _ => return None,
    }
    Some(style)
}
