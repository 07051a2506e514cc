use super::*;

/// Result of parsing one HTML source.
#[derive(Debug)]
pub(crate) struct ParseOutput {
    pub(crate) dom: Dom,
    /// Bodies of `<style>` elements, in document order.
    pub(crate) style_sheets: Vec<String>,
    /// `<iframe srcdoc>` hosts and their markup.
    pub(crate) frames: Vec<(NodeId, String)>,
}

const RAW_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "title", "textarea"];

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "ensp" => Some('\u{2002}'),
            "emsp" => Some('\u{2003}'),
            "thinsp" => Some('\u{2009}'),
            "copy" => Some('©'),
            "reg" => Some('®'),
            "trade" => Some('™'),
            "hellip" => Some('…'),
            "middot" => Some('·'),
            "laquo" => Some('«'),
            "raquo" => Some('»'),
            "larr" => Some('←'),
            "rarr" => Some('→'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let token_end = tail
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '#'))
            .unwrap_or(tail.len());
        let raw = &tail[..token_end];
        let decoded = match raw.strip_prefix('#') {
            Some(numeric) => decode_numeric(numeric),
            None => decode_named(raw),
        };
        match decoded {
            Some(ch) if !raw.is_empty() => {
                out.push(ch);
                let consumed = if tail[token_end..].starts_with(';') {
                    token_end + 1
                } else {
                    token_end
                };
                rest = &tail[consumed..];
            }
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn parse_html(html: &str) -> Result<ParseOutput> {
    let mut dom = Dom::new();
    let mut style_sheets = Vec::new();
    let mut frames = Vec::new();

    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
            i = end + 3;
            continue;
        }

        let opens_markup = bytes
            .get(i + 1)
            .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'/' || *b == b'!');
        if bytes[i] == b'<' && opens_markup {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;

                // Stray end tags with no open match are ignored.
                if let Some(pos) = stack
                    .iter()
                    .rposition(|node| dom.has_tag(*node, &tag))
                    .filter(|pos| *pos > 0)
                {
                    stack.truncate(pos);
                }
                continue;
            }

            if starts_with_at(bytes, i, b"<!") {
                i = parse_declaration_tag(html, i)?;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            close_optional_start_tags(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let srcdoc = attrs.get("srcdoc").cloned();
            let node = dom.create_element(parent, tag.clone(), attrs);
            if tag == "iframe" {
                frames.push((node, srcdoc.unwrap_or_default()));
            }

            if RAW_TEXT_TAGS.contains(&tag.as_str()) && !self_closing {
                let close = find_case_insensitive_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                let body = html.get(i..close).unwrap_or_default();
                let body = if matches!(tag.as_str(), "title" | "textarea") {
                    decode_html_character_references(body)
                } else {
                    body.to_string()
                };
                if tag == "style" {
                    style_sheets.push(body.clone());
                }
                if !body.is_empty() {
                    dom.create_text(node, body);
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let mut decoded = decode_html_character_references(text);
            if dom.has_tag(parent, "pre") && dom.children(parent).is_empty() {
                decoded = decoded
                    .strip_prefix('\n')
                    .map(str::to_string)
                    .unwrap_or(decoded);
            }
            if !decoded.is_empty() {
                dom.create_text(parent, decoded);
            }
        }
    }

    normalize_document_structure(&mut dom)?;
    dom.initialize_form_control_values()?;
    dom.normalize_radio_groups()?;
    Ok(ParseOutput {
        dom,
        style_sheets,
        frames,
    })
}

/// Guarantees a single `html` root with a `body`, moving stray content in.
fn normalize_document_structure(dom: &mut Dom) -> Result<()> {
    let html = match dom.document_element() {
        Some(html) => html,
        None => {
            let html = dom.create_detached_element("html");
            dom.append_child(dom.root, html)?;
            html
        }
    };
    let strays: Vec<NodeId> = dom
        .children(dom.root)
        .iter()
        .copied()
        .filter(|node| *node != html)
        .collect();
    for node in strays {
        if dom.text(node).is_some_and(|text| text.trim().is_empty()) {
            dom.remove_node(node)?;
        } else {
            dom.append_child(html, node)?;
        }
    }

    let body = match dom.body() {
        Some(body) => body,
        None => {
            let body = dom.create_detached_element("body");
            dom.append_child(html, body)?;
            body
        }
    };
    let strays: Vec<NodeId> = dom
        .children(html)
        .iter()
        .copied()
        .filter(|node| *node != body && !dom.has_tag(*node, "head"))
        .collect();
    for node in strays {
        dom.append_child(body, node)?;
    }
    Ok(())
}

fn close_optional_start_tags(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    match tag {
        "dt" | "dd" => close_open_tag(dom, stack, &["dt", "dd"], &["dl"]),
        "li" => close_open_tag(dom, stack, &["li"], &["ol", "ul", "menu"]),
        "option" => close_open_tag(dom, stack, &["option"], &["optgroup", "select", "datalist"]),
        "optgroup" => {
            close_open_tag(dom, stack, &["option"], &["optgroup", "select", "datalist"]);
            close_open_tag(dom, stack, &["optgroup"], &["select"]);
        }
        _ if is_optional_paragraph_terminator_tag(tag) => close_open_tag(dom, stack, &["p"], &[]),
        _ => {}
    }
}

/// Pops the nearest open element named in `closes`, unless an element named
/// in `scope` is hit first.
fn close_open_tag(dom: &Dom, stack: &mut Vec<NodeId>, closes: &[&str], scope: &[&str]) {
    for index in (1..stack.len()).rev() {
        let Some(open_tag) = dom.tag_name(stack[index]) else {
            continue;
        };
        if closes.iter().any(|t| open_tag.eq_ignore_ascii_case(t)) {
            stack.truncate(index);
            return;
        }
        if scope.iter().any(|t| open_tag.eq_ignore_ascii_case(t)) {
            return;
        }
    }
}

fn is_optional_paragraph_terminator_tag(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "details"
            | "div"
            | "dl"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "ul"
    )
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed start tag".into()));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
            self_closing = true;
            i += 2;
            break;
        }

        if !is_attr_name_char(bytes[i]) {
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && bytes[i] != b'>'
                && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
            {
                i += 1;
            }
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        skip_ws(bytes, &mut i);

        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, bytes, &mut i)?
        } else {
            String::new()
        };

        // First occurrence wins.
        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_declaration_tag(html: &str, at: usize) -> Result<usize> {
    let bytes = html.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = at + 2;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == b'>' => return Ok(i + 1),
            None => {}
        }
        i += 1;
    }

    Err(Error::HtmlParse("unclosed declaration tag".into()))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse("unclosed end tag".into()));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        *i += 1;
        return Ok(decode_html_character_references(value));
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !(bytes[*i] == b'/' && bytes.get(*i + 1) == Some(&b'>'))
    {
        *i += 1;
    }

    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_html_character_references(value))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|window| window == needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn find_case_insensitive_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1) == Some(&b'/') {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let tag_end = j + tag.len();
            if tag_end <= bytes.len()
                && bytes[j..tag_end].eq_ignore_ascii_case(tag)
                && bytes.get(tag_end).is_none_or(|b| !b.is_ascii_alphanumeric())
            {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}
