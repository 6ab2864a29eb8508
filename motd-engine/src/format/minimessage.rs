use super::ParseError;
use super::effects::Paint;
use crate::richtext::{Color, RichText, Style};

/// Tag markup: `<red>`, `<#ff8800>`, `<color:gold>`, decorations, closing
/// tags, `<reset>`, `<newline>`, `<gradient:..>` and `<rainbow>`. `\<`
/// escapes a literal bracket, and a `<` that cannot begin a tag is text.
pub(super) fn parse(raw: &str) -> Result<RichText, ParseError> {
    let mut markup = Markup::default();
    let mut chars = raw.char_indices().peekable();

    while let Some((at, ch)) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some((_, '<'))) => {
                chars.next();
                markup.text.push('<');
            }
            '§' => return Err(ParseError::SectionSign(at)),
            '<' if opens_tag(&raw[at + 1..]) => {
                let body = at + 1;
                let end = match raw[body..].find(['<', '>']) {
                    Some(offset) if raw[body + offset..].starts_with('>') => body + offset,
                    _ => return Err(ParseError::UnclosedTag(at)),
                };
                markup.flush();
                markup.apply(raw[body..end].trim())?;
                while chars.next_if(|(index, _)| *index <= end).is_some() {}
            }
            other => markup.text.push(other),
        }
    }
    Ok(markup.finish())
}

/// A tag starts with a name, a hex color or a closing slash.
fn opens_tag(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '#' || c == '/')
}

#[derive(Debug)]
struct Open {
    name: String,
    style: Style,
    /// Color effect and the char offset where it starts.
    paint: Option<(Paint, usize)>,
}

#[derive(Debug, Default)]
struct Markup {
    out: RichText,
    stack: Vec<Open>,
    text: String,
}

impl Markup {
    fn style(&self) -> Style {
        self.stack.last().map_or_else(Style::default, |open| open.style)
    }

    fn flush(&mut self) {
        let style = self.style();
        self.out.push(&self.text, style);
        self.text.clear();
    }

    /// Pop every tag from `position` up, painting effects innermost first.
    fn close_from(&mut self, position: usize) {
        for open in self.stack.drain(position..).rev() {
            if let Some((paint, start)) = open.paint {
                self.out
                    .paint_from(start, |index, total| paint.color_at(index, total));
            }
        }
    }

    fn apply(&mut self, tag: &str) -> Result<(), ParseError> {
        if let Some(name) = tag.strip_prefix('/') {
            let name = canonical(name);
            let name = name.split_once(':').map_or(name.as_str(), |(head, _)| head);
            let position = if name.is_empty() {
                self.stack.len().checked_sub(1)
            } else {
                self.stack.iter().rposition(|open| open.name == name)
            };
            if let Some(position) = position {
                self.close_from(position);
            }
            return Ok(());
        }

        let name = canonical(tag);
        let (head, args) = name.split_once(':').unwrap_or((name.as_str(), ""));
        let style = self.style();
        let open = match head {
            "reset" => {
                self.close_from(0);
                return Ok(());
            }
            "newline" | "br" => {
                self.text.push('\n');
                return Ok(());
            }
            "gradient" | "rainbow" => {
                let paint = Paint::parse(head, args)
                    .ok_or_else(|| ParseError::UnknownTag(tag.to_string()))?;
                Open {
                    name: head.to_string(),
                    style,
                    paint: Some((paint, self.out.char_count())),
                }
            }
            _ => Open {
                style: styled(&name, style)
                    .ok_or_else(|| ParseError::UnknownTag(tag.to_string()))?,
                name: name.clone(),
                paint: None,
            },
        };
        self.stack.push(open);
        Ok(())
    }

    /// Unclosed tags run to the end of the input.
    fn finish(mut self) -> RichText {
        self.flush();
        self.close_from(0);
        self.out
    }
}

/// Lower-cased tag name with aliases folded, so `<b>` closes with `</bold>`.
fn canonical(tag: &str) -> String {
    let lower = tag.trim().to_ascii_lowercase();
    let folded = match lower.as_str() {
        "b" => "bold",
        "i" | "em" => "italic",
        "u" => "underlined",
        "st" => "strikethrough",
        "obf" => "obfuscated",
        _ => {
            if let Some(value) = ["color:", "colour:", "c:"]
                .iter()
                .find_map(|prefix| lower.strip_prefix(prefix))
            {
                return value.to_string();
            }
            return lower;
        }
    };
    folded.to_string()
}

fn styled(name: &str, base: Style) -> Option<Style> {
    let mut style = base;
    match name {
        "bold" => style.bold = true,
        "italic" => style.italic = true,
        "underlined" => style.underlined = true,
        "strikethrough" => style.strikethrough = true,
        "obfuscated" => style.obfuscated = true,
        other => style.color = Some(Color::parse(other)?),
    }
    Some(style)
}
