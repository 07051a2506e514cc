use super::*;

use std::sync::LazyLock;

/// First letter of each word, for `text-transform: capitalize`.
static WORD_START: LazyLock<Option<fancy_regex::Regex>> =
    LazyLock::new(|| fancy_regex::Regex::new(r"(?<![\p{L}\p{N}_'])\p{L}").ok());

impl Document {
    /// Rendered text of `node`: hidden subtrees are skipped, `<br>` and
    /// block boundaries start new lines, and whitespace collapses according
    /// to `white-space`.
    pub(crate) fn visible_text(&self, node: NodeId) -> String {
        if self.has_display_none(node) {
            return String::new();
        }
        let mut lines = vec![String::new()];
        self.append_visible_text(node, &mut lines);
        let joined = lines
            .iter()
            .map(|line| trim_collapsible(line))
            .collect::<Vec<_>>()
            .join("\n");
        trim_collapsible(&joined).replace('\u{a0}', " ")
    }

    fn append_visible_text(&self, node: NodeId, lines: &mut Vec<String>) {
        if let Some(text) = self.dom.text(node) {
            let Some(parent) = self.dom.parent_element(node) else {
                return;
            };
            if matches!(
                self.computed_style(parent, "visibility").as_str(),
                "hidden" | "collapse"
            ) {
                return;
            }
            let white_space = self.computed_style(parent, "white-space");
            let transformed = text_transform(text, &self.computed_style(parent, "text-transform"));
            push_text(lines, &transformed, &white_space);
            return;
        }
        if self.dom.element(node).is_none() {
            return;
        }
        if self.computed_style(node, "display") == "none"
            || parse_css_number(&self.computed_style(node, "opacity")).is_some_and(|o| o <= 0.0)
        {
            return;
        }
        if self.dom.has_tag(node, "br") {
            lines.push(String::new());
            return;
        }
        if self.dom.has_tag(node, "textarea") || self.dom.has_tag(node, "select") {
            return;
        }

        let display = self.computed_style(node, "display");
        let is_block = !display.starts_with("inline") && display != "table-cell";
        let last_is_open = |lines: &Vec<String>| {
            lines
                .last()
                .is_some_and(|line| !trim_collapsible(line).is_empty())
        };
        if is_block && last_is_open(lines) {
            lines.push(String::new());
        }
        if display == "table-cell" {
            if let Some(last) = lines.last_mut() {
                if !last.is_empty() && !last.ends_with(' ') {
                    last.push(' ');
                }
            }
        }

        for child in self.dom.children(node).to_vec() {
            self.append_visible_text(child, lines);
        }

        if is_block && last_is_open(lines) {
            lines.push(String::new());
        }
    }
}

fn push_text(lines: &mut Vec<String>, text: &str, white_space: &str) {
    let Some(last) = lines.last_mut() else {
        return;
    };
    match white_space {
        "pre" | "pre-wrap" | "break-spaces" => {
            let text = text.replace("\r\n", "\n").replace('\r', "\n");
            let mut parts = text.split('\n');
            if let Some(first) = parts.next() {
                last.push_str(first);
            }
            for part in parts {
                lines.push(part.to_string());
            }
        }
        "pre-line" => {
            let text = text.replace("\r\n", "\n");
            let mut parts = text.split('\n').map(collapse_spaces);
            if let Some(first) = parts.next() {
                append_collapsed(last, &first);
            }
            for part in parts {
                lines.push(part.trim_start_matches(' ').to_string());
            }
        }
        _ => {
            let collapsed = collapse_spaces(&text.replace(['\n', '\r'], " "));
            append_collapsed(last, &collapsed);
        }
    }
}

/// Appends without doubling a space at the seam.
fn append_collapsed(line: &mut String, text: &str) {
    if (line.is_empty() || line.ends_with(' ')) && text.starts_with(' ') {
        line.push_str(&text[1..]);
    } else {
        line.push_str(text);
    }
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if matches!(ch, ' ' | '\t' | '\u{c}') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Trims ordinary whitespace but keeps non-breaking spaces.
fn trim_collapsible(text: &str) -> &str {
    text.trim_matches(|ch: char| ch.is_whitespace() && ch != '\u{a0}')
}

fn text_transform(text: &str, transform: &str) -> String {
    match transform {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        "capitalize" => {
            let Some(pattern) = WORD_START.as_ref() else {
                return text.to_string();
            };
            let mut out = String::with_capacity(text.len());
            let mut cursor = 0;
            for found in pattern.find_iter(text).filter_map(|found| found.ok()) {
                out.push_str(&text[cursor..found.start()]);
                out.extend(found.as_str().chars().flat_map(char::to_uppercase));
                cursor = found.end();
            }
            out.push_str(&text[cursor..]);
            out
        }
        _ => text.to_string(),
    }
}
