use super::*;

pub(crate) fn parse_style_declarations(style_attr: Option<&str>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(style_attr) = style_attr else {
        return out;
    };

    let mut start = 0usize;
    let mut i = 0usize;
    let bytes = style_attr.as_bytes();
    let mut paren_depth = 0isize;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let ch = bytes[i];
        match (quote, ch) {
            (Some(_), b'\\') if i + 1 < bytes.len() => {
                i += 2;
                continue;
            }
            (Some(q), _) if ch == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'') | (None, b'"') => quote = Some(ch),
            (None, b'(') => paren_depth += 1,
            (None, b')') => paren_depth = (paren_depth - 1).max(0),
            (None, b';') if paren_depth == 0 => {
                push_style_declaration(&style_attr[start..i], &mut out);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    push_style_declaration(&style_attr[start..], &mut out);
    out
}

pub(crate) fn push_style_declaration(raw_decl: &str, out: &mut Vec<(String, String)>) {
    let decl = raw_decl.trim();
    let Some((name, value)) = decl.split_once(':') else {
        return;
    };
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return;
    }
    let value = value
        .trim()
        .trim_end_matches("!important")
        .trim()
        .to_string();

    for (longhand, longhand_value) in expand_shorthand(&name, &value) {
        if let Some(pos) = out.iter().position(|(existing, _)| *existing == longhand) {
            out[pos].1 = longhand_value;
        } else {
            out.push((longhand, longhand_value));
        }
    }
}

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Splits the box shorthands this engine lays out with into longhands. Other
/// declarations pass through unchanged.
fn expand_shorthand(name: &str, value: &str) -> Vec<(String, String)> {
    match name {
        "margin" | "padding" | "border-width" => {
            let prefix = name.trim_end_matches("-width");
            let suffix = if name == "border-width" { "-width" } else { "" };
            let edges = four_edge_values(value);
            SIDES
                .iter()
                .zip(edges)
                .map(|(side, v)| (format!("{prefix}-{side}{suffix}"), v))
                .collect()
        }
        "border" => {
            let width = border_width_token(value);
            SIDES
                .iter()
                .map(|side| (format!("border-{side}-width"), width.clone()))
                .collect()
        }
        "border-top" | "border-right" | "border-bottom" | "border-left" => {
            vec![(format!("{name}-width"), border_width_token(value))]
        }
        "overflow" => {
            let mut parts = value.split_whitespace();
            let x = parts.next().unwrap_or("visible").to_string();
            let y = parts.next().map(str::to_string).unwrap_or_else(|| x.clone());
            vec![("overflow-x".into(), x), ("overflow-y".into(), y)]
        }
        _ => vec![(name.to_string(), value.to_string())],
    }
}

fn four_edge_values(value: &str) -> [String; 4] {
    let parts = value.split_whitespace().map(str::to_string).collect::<Vec<_>>();
    match parts.as_slice() {
        [all] => [all.clone(), all.clone(), all.clone(), all.clone()],
        [v, h] => [v.clone(), h.clone(), v.clone(), h.clone()],
        [t, h, b] => [t.clone(), h.clone(), b.clone(), h.clone()],
        [t, r, b, l, ..] => [t.clone(), r.clone(), b.clone(), l.clone()],
        [] => Default::default(),
    }
}

fn border_width_token(value: &str) -> String {
    if value.trim().eq_ignore_ascii_case("none") {
        return "0".into();
    }
    value
        .split_whitespace()
        .find(|token| parse_css_px(token).is_some())
        .map(str::to_string)
        .unwrap_or_else(|| "medium".into())
}

/// Resolves a length to CSS pixels. `em` is taken against a 16px font.
pub(crate) fn parse_css_px(raw: &str) -> Option<f64> {
    let raw = raw.trim().to_ascii_lowercase();
    match raw.as_str() {
        "0" => return Some(0.0),
        "thin" => return Some(1.0),
        "medium" => return Some(3.0),
        "thick" => return Some(5.0),
        _ => {}
    }
    let (number, scale) = if let Some(n) = raw.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = raw.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = raw.strip_suffix("em") {
        (n, 16.0)
    } else if let Some(n) = raw.strip_suffix("pt") {
        (n, 4.0 / 3.0)
    } else {
        (raw.as_str(), 1.0)
    };
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value * scale)
}

pub(crate) fn parse_css_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Some(percent) = raw.strip_suffix('%') {
        return percent.trim().parse::<f64>().ok().map(|value| value / 100.0);
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

pub(crate) fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Byte offset of the `char_index`-th character, clamped to the end.
pub(crate) fn byte_offset(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map(|(offset, _)| offset)
        .unwrap_or(value.len())
}
