use super::*;

/// Where specified style values come from.
///
/// A document picks one implementation when it is built (see
/// [`StyleSourceKind`]); every style read goes through it.
pub trait StyleSource: fmt::Debug {
    /// The specified value of `property` on `node`, or `None` when nothing
    /// sets it and the initial or inherited value applies.
    fn specified(&self, doc: &Document, node: NodeId, property: &str) -> Option<String>;
}

/// Inline style, then matching stylesheet rules, then user-agent defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformStyle;

/// Inline style and user-agent defaults only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCascade;

impl StyleSource for PlatformStyle {
    fn specified(&self, doc: &Document, node: NodeId, property: &str) -> Option<String> {
        inline_declaration(&doc.dom, node, property)
            .or_else(|| doc.stylesheet.declaration(&doc.dom, node, property))
            .or_else(|| user_agent_default(&doc.dom, node, property))
    }
}

impl StyleSource for LegacyCascade {
    fn specified(&self, doc: &Document, node: NodeId, property: &str) -> Option<String> {
        inline_declaration(&doc.dom, node, property)
            .or_else(|| user_agent_default(&doc.dom, node, property))
    }
}

const INHERITED_PROPERTIES: &[&str] = &[
    "visibility",
    "white-space",
    "pointer-events",
    "text-transform",
];

fn inline_declaration(dom: &Dom, node: NodeId, property: &str) -> Option<String> {
    let style = dom.attr(node, "style")?;
    parse_style_declarations(Some(&style))
        .into_iter()
        .rev()
        .find(|(name, _)| name == property)
        .map(|(_, value)| value)
}

fn user_agent_default(dom: &Dom, node: NodeId, property: &str) -> Option<String> {
    let element = dom.element(node)?;
    match property {
        "display" => {
            if element.attrs.contains_key("hidden") || is_hidden_input(dom, node) {
                return Some("none".into());
            }
            let display = match element.tag_name.to_ascii_lowercase().as_str() {
                "head" | "script" | "style" | "template" | "title" | "meta" | "link"
                | "noscript" | "base" => "none",
                "html" | "body" | "div" | "p" | "form" | "fieldset" | "h1" | "h2" | "h3"
                | "h4" | "h5" | "h6" | "ul" | "ol" | "li" | "section" | "article" | "header"
                | "footer" | "nav" | "main" | "aside" | "pre" | "blockquote" | "table"
                | "tr" | "details" | "summary" | "dl" | "dt" | "dd" | "hr" | "legend"
                | "address" | "figure" | "option" | "optgroup" | "tbody" | "thead"
                | "tfoot" => "block",
                "td" | "th" => "table-cell",
                "input" | "button" | "select" | "textarea" | "img" | "iframe" | "svg" => {
                    "inline-block"
                }
                _ => "inline",
            };
            Some(display.into())
        }
        "white-space" if element.is_tag("pre") || element.is_tag("textarea") => {
            Some("pre".into())
        }
        "padding-top" | "padding-bottom" if element.is_tag("button") => Some("2px".into()),
        "padding-left" | "padding-right" if element.is_tag("button") => Some("8px".into()),
        _ => None,
    }
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "display" => "inline",
        "visibility" => "visible",
        "opacity" => "1",
        "overflow-x" | "overflow-y" => "visible",
        "position" => "static",
        "pointer-events" => "auto",
        "white-space" => "normal",
        "text-transform" => "none",
        "stroke-width" => "1",
        "width" | "height" | "top" | "left" | "right" | "bottom" => "auto",
        _ => "0",
    }
}

impl Document {
    /// Resolved value of `property`, following `inherit` and inherited
    /// properties up to the nearest ancestor that sets them.
    pub fn computed_style(&self, node: NodeId, property: &str) -> String {
        let property = property.trim().to_ascii_lowercase();
        let mut current = Some(node);
        while let Some(node) = current.filter(|n| self.dom.element(*n).is_some()) {
            match self.style_source.specified(self, node, &property) {
                Some(value) if !value.eq_ignore_ascii_case("inherit") => {
                    return value.to_ascii_lowercase();
                }
                Some(_) => {}
                None if INHERITED_PROPERTIES.contains(&property.as_str()) => {}
                None => return initial_value(&property).to_string(),
            }
            current = self.dom.parent_element(node);
        }
        initial_value(&property).to_string()
    }

    pub(crate) fn style_px(&self, node: NodeId, property: &str) -> Option<f64> {
        parse_css_px(&self.computed_style(node, property))
    }

    pub(crate) fn edges(&self, node: NodeId, prefix: &str, suffix: &str) -> Edges {
        let side = |name: &str| {
            self.style_px(node, &format!("{prefix}-{name}{suffix}"))
                .unwrap_or(0.0)
                .max(0.0)
        };
        Edges {
            top: side("top"),
            right: side("right"),
            bottom: side("bottom"),
            left: side("left"),
        }
    }

    pub(crate) fn border_widths(&self, node: NodeId) -> Edges {
        self.edges(node, "border", "-width")
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StyleRule {
    pub(crate) selectors: Vec<(Vec<SelectorPart>, (usize, usize, usize))>,
    pub(crate) declarations: Vec<(String, String)>,
}

/// Rules collected from the document's `<style>` elements.
#[derive(Debug, Clone, Default)]
pub(crate) struct Stylesheet {
    pub(crate) rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parses plain rule blocks. At-rules are skipped whole and rules with an
    /// unparsable selector are dropped.
    pub(crate) fn parse(sources: &[String]) -> Self {
        let mut rules = Vec::new();
        for source in sources {
            let css = strip_css_comments(source);
            let mut rest = css.as_str();
            while let Some(open) = rest.find('{') {
                let prelude = rest[..open].trim();
                let Some(close) = find_block_end(&rest[open..]).map(|end| end + open) else {
                    break;
                };
                let body = &rest[open + 1..close];
                rest = &rest[close + 1..];
                if prelude.starts_with('@') {
                    continue;
                }
                let Ok(groups) = parse_selector_groups(prelude) else {
                    tracing::debug!(selector = prelude, "skipping unsupported stylesheet rule");
                    continue;
                };
                let selectors = groups
                    .into_iter()
                    .map(|chain| {
                        let specificity = chain_specificity(&chain);
                        (chain, specificity)
                    })
                    .collect();
                rules.push(StyleRule {
                    selectors,
                    declarations: parse_style_declarations(Some(body)),
                });
            }
        }
        Self { rules }
    }

    /// Winning declaration for `property`: highest specificity, then latest.
    pub(crate) fn declaration(&self, dom: &Dom, node: NodeId, property: &str) -> Option<String> {
        let mut best: Option<((usize, usize, usize), usize, &str)> = None;
        for (order, rule) in self.rules.iter().enumerate() {
            let Some((_, value)) = rule
                .declarations
                .iter()
                .rev()
                .find(|(name, _)| name == property)
            else {
                continue;
            };
            let Some(specificity) = rule
                .selectors
                .iter()
                .filter(|(chain, _)| dom.matches_selector_chain(node, chain))
                .map(|(_, specificity)| *specificity)
                .max()
            else {
                continue;
            };
            if best.is_none_or(|(s, o, _)| (specificity, order) >= (s, o)) {
                best = Some((specificity, order, value));
            }
        }
        best.map(|(_, _, value)| value.to_string())
    }
}

fn strip_css_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing the block opened at `block[0]`.
fn find_block_end(block: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, ch) in block.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
