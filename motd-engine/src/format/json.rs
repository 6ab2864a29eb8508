use serde_json::Value;

use super::ParseError;
use crate::richtext::{Color, RichText, Style};

/// Chat-component JSON: a string, an array of components, or an object with
/// `text`, style keys and `extra` children.
pub(super) fn parse(raw: &str) -> Result<RichText, ParseError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    let mut out = RichText::new();
    append(&value, Style::default(), &mut out)?;
    Ok(out)
}

fn append(value: &Value, inherited: Style, out: &mut RichText) -> Result<(), ParseError> {
    match value {
        Value::String(text) => out.push(text, inherited),
        Value::Array(children) => {
            for child in children {
                append(child, inherited, out)?;
            }
        }
        Value::Object(node) => {
            let style = component_style(node, inherited)?;
            match node.get("text") {
                Some(Value::String(text)) => out.push(text, style),
                Some(other) => {
                    return Err(ParseError::Component(format!("text must be a string: {other}")));
                }
                None if node.contains_key("extra") => {}
                None => return Err(ParseError::Component("missing text".to_string())),
            }
            if let Some(extra) = node.get("extra") {
                let Value::Array(children) = extra else {
                    return Err(ParseError::Component("extra must be an array".to_string()));
                };
                for child in children {
                    append(child, style, out)?;
                }
            }
        }
        other => return Err(ParseError::Component(format!("unexpected value {other}"))),
    }
    Ok(())
}

fn component_style(
    node: &serde_json::Map<String, Value>,
    inherited: Style,
) -> Result<Style, ParseError> {
    let mut style = inherited;
    if let Some(color) = node.get("color") {
        let parsed = color
            .as_str()
            .and_then(Color::parse)
            .ok_or_else(|| ParseError::Component(format!("bad color {color}")))?;
        style.color = Some(parsed);
    }
    for (key, flag) in [
        ("bold", &mut style.bold),
        ("italic", &mut style.italic),
        ("underlined", &mut style.underlined),
        ("strikethrough", &mut style.strikethrough),
        ("obfuscated", &mut style.obfuscated),
    ] {
        if let Some(value) = node.get(key) {
            *flag = value
                .as_bool()
                .ok_or_else(|| ParseError::Component(format!("{key} must be a boolean")))?;
        }
    }
    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::NamedColor;

    #[test]
    fn nested_extra_inherits_style() {
        let raw = r##"{"text":"A","color":"#112233","extra":[{"text":"B","bold":true},"C"]}"##;
        let rich = parse(raw).unwrap();
        let spans = rich.spans();
        assert_eq!(rich.to_plain(), "ABC");
        assert_eq!(spans[0].style.color, Some(Color::Rgb(0x112233)));
        assert!(spans[1].style.bold);
        assert_eq!(spans[1].style.color, Some(Color::Rgb(0x112233)));
        assert!(!spans[2].style.bold);
    }

    #[test]
    fn array_root_and_newlines() {
        let rich = parse(r#"[{"text":"top","color":"aqua"},"\nbottom"]"#).unwrap();
        assert_eq!(rich.lines(), vec!["top", "bottom"]);
        assert_eq!(rich.spans()[0].style.color, Some(Color::Named(NamedColor::Aqua)));
    }

    #[test]
    fn rejects_malformed_components() {
        assert!(matches!(parse("{"), Err(ParseError::Json(_))));
        assert!(matches!(parse("42"), Err(ParseError::Component(_))));
        assert!(matches!(parse(r#"{"color":"red"}"#), Err(ParseError::Component(_))));
        assert!(matches!(
            parse(r#"{"text":"x","color":"mauve"}"#),
            Err(ParseError::Component(_))
        ));
    }
}
