use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
    DashMatch { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorPseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    Checked,
    Disabled,
    Enabled,
    Focus,
    Empty,
    NthChild(NthChildSelector),
    Not(Vec<Vec<SelectorPart>>),
    Is(Vec<Vec<SelectorPart>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NthChildSelector {
    Exact(usize),
    Odd,
    Even,
    AnPlusB(i64, i64),
}

impl NthChildSelector {
    pub(crate) fn matches(&self, position: usize) -> bool {
        match self {
            Self::Exact(n) => position == *n,
            Self::Odd => position % 2 == 1,
            Self::Even => position % 2 == 0,
            Self::AnPlusB(a, b) => {
                let position = position as i64;
                if *a == 0 {
                    return position == *b;
                }
                let delta = position - b;
                delta % a == 0 && delta / a >= 0
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
    pub(crate) pseudo_classes: Vec<SelectorPseudoClass>,
}

impl SelectorStep {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && !self.universal
            && self.pseudo_classes.is_empty()
    }

    /// (ids, classes/attributes/pseudo-classes, tags)
    pub(crate) fn specificity(&self) -> (usize, usize, usize) {
        let mut ids = usize::from(self.id.is_some());
        let mut classes = self.classes.len() + self.attrs.len();
        let mut tags = usize::from(self.tag.is_some());
        for pseudo in &self.pseudo_classes {
            match pseudo {
                SelectorPseudoClass::Not(inners) | SelectorPseudoClass::Is(inners) => {
                    let inner = inners
                        .iter()
                        .map(|chain| chain_specificity(chain))
                        .max()
                        .unwrap_or_default();
                    ids += inner.0;
                    classes += inner.1;
                    tags += inner.2;
                }
                _ => classes += 1,
            }
        }
        (ids, classes, tags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the previous (left) part.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn chain_specificity(chain: &[SelectorPart]) -> (usize, usize, usize) {
    chain.iter().fold((0, 0, 0), |acc, part| {
        let s = part.step.specificity();
        (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2)
    })
}

fn invalid_selector(selector: &str) -> Error {
    Error::InvalidSelector(format!(
        "An invalid or illegal selector was specified: {selector}"
    ))
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    let groups = split_selector_groups(selector)?;
    let mut parsed = Vec::with_capacity(groups.len());
    for group in groups {
        parsed.push(parse_selector_chain(&group)?);
    }
    Ok(parsed)
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(invalid_selector(selector));
    }

    let mut steps: Vec<SelectorPart> = Vec::new();
    let mut pending_combinator = None;

    for token in tokenize_selector(selector)? {
        let combinator = match token.as_str() {
            ">" => Some(SelectorCombinator::Child),
            "+" => Some(SelectorCombinator::AdjacentSibling),
            "~" => Some(SelectorCombinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending_combinator.is_some() || steps.is_empty() {
                return Err(invalid_selector(selector));
            }
            pending_combinator = Some(combinator);
            continue;
        }

        let step = parse_selector_step(&token).map_err(|_| invalid_selector(selector))?;
        let combinator = if steps.is_empty() {
            None
        } else {
            Some(
                pending_combinator
                    .take()
                    .unwrap_or(SelectorCombinator::Descendant),
            )
        };
        steps.push(SelectorPart { step, combinator });
    }

    if steps.is_empty() || pending_combinator.is_some() {
        return Err(invalid_selector(selector));
    }
    Ok(steps)
}

/// Feeds top-level characters to `on_separator`, which returns true when it
/// consumed the character as a separator.
fn split_top_level(
    selector: &str,
    mut on_separator: impl FnMut(char, &mut String, &mut Vec<String>) -> bool,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid_selector(selector))?;
            }
            '(' => paren_depth += 1,
            ')' => {
                paren_depth = paren_depth
                    .checked_sub(1)
                    .ok_or_else(|| invalid_selector(selector))?;
            }
            _ if bracket_depth == 0 && paren_depth == 0 => {
                if on_separator(ch, &mut current, &mut out) {
                    continue;
                }
            }
            _ => {}
        }
        current.push(ch);
    }

    if bracket_depth != 0 || paren_depth != 0 {
        return Err(invalid_selector(selector));
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    Ok(out)
}

pub(crate) fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut empty_group = false;
    let groups = split_top_level(selector, |ch, current, out| {
        if ch != ',' {
            return false;
        }
        if current.trim().is_empty() {
            empty_group = true;
        }
        out.push(current.trim().to_string());
        current.clear();
        true
    })?;
    if empty_group || groups.is_empty() || selector.trim_end().ends_with(',') {
        return Err(invalid_selector(selector));
    }
    Ok(groups)
}

pub(crate) fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    split_top_level(selector, |ch, current, out| match ch {
        '>' | '+' | '~' => {
            if !current.trim().is_empty() {
                out.push(current.trim().to_string());
            }
            current.clear();
            out.push(ch.to_string());
            true
        }
        ch if ch.is_ascii_whitespace() => {
            if !current.trim().is_empty() {
                out.push(current.trim().to_string());
            }
            current.clear();
            true
        }
        _ => false,
    })
}

pub(crate) fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let part = part.trim();
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal {
                    return Err(invalid_selector(part));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) =
                    parse_selector_ident(part, i + 1).ok_or_else(|| invalid_selector(part))?;
                if step.id.replace(id).is_some() {
                    return Err(invalid_selector(part));
                }
                i = next;
            }
            b'.' => {
                let (class_name, next) =
                    parse_selector_ident(part, i + 1).ok_or_else(|| invalid_selector(part))?;
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (attr, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(attr);
                i = next;
            }
            b':' => {
                let (pseudo, next) =
                    parse_selector_pseudo(part, i + 1).ok_or_else(|| invalid_selector(part))?;
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if step.tag.is_some()
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || step.universal
                {
                    return Err(invalid_selector(part));
                }
                let (tag, next) =
                    parse_selector_ident(part, i).ok_or_else(|| invalid_selector(part))?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() {
        return Err(invalid_selector(part));
    }
    Ok(step)
}

fn simple_pseudo_class(name: &str) -> Option<SelectorPseudoClass> {
    Some(match name {
        "first-child" => SelectorPseudoClass::FirstChild,
        "last-child" => SelectorPseudoClass::LastChild,
        "only-child" => SelectorPseudoClass::OnlyChild,
        "checked" => SelectorPseudoClass::Checked,
        "disabled" => SelectorPseudoClass::Disabled,
        "enabled" => SelectorPseudoClass::Enabled,
        "focus" => SelectorPseudoClass::Focus,
        "empty" => SelectorPseudoClass::Empty,
        _ => return None,
    })
}

fn parse_selector_pseudo(part: &str, start: usize) -> Option<(SelectorPseudoClass, usize)> {
    let tail = part.get(start..)?;
    let name_len = tail
        .bytes()
        .take_while(|b| is_selector_ident_char(*b))
        .count();
    let name = tail[..name_len].to_ascii_lowercase();
    let after_name = start + name_len;

    if part.as_bytes().get(after_name) != Some(&b'(') {
        return simple_pseudo_class(&name).map(|pseudo| (pseudo, after_name));
    }

    let body_start = after_name + 1;
    let close = find_matching_paren(part.get(body_start..)?)?;
    let body = part[body_start..body_start + close].trim();
    let next = body_start + close + 1;
    if body.is_empty() {
        return None;
    }
    if let Some(ch) = part.as_bytes().get(next) {
        if !is_selector_continuation(*ch) {
            return None;
        }
    }

    let pseudo = match name.as_str() {
        "nth-child" => SelectorPseudoClass::NthChild(parse_nth_child_selector(body)?),
        "not" | "is" | "where" => {
            let chains = split_selector_groups(body)
                .ok()?
                .iter()
                .map(|group| parse_selector_chain(group))
                .collect::<Result<Vec<_>>>()
                .ok()?;
            if name == "not" {
                SelectorPseudoClass::Not(chains)
            } else {
                SelectorPseudoClass::Is(chains)
            }
        }
        _ => return None,
    };
    Some((pseudo, next))
}

fn find_matching_paren(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    for (idx, b) in body.bytes().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_nth_child_selector(raw: &str) -> Option<NthChildSelector> {
    let compact = raw
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.as_str() {
        "odd" => Some(NthChildSelector::Odd),
        "even" => Some(NthChildSelector::Even),
        expr if expr.contains('n') => {
            let (a_part, b_part) = expr.split_once('n')?;
            let a = match a_part {
                "" | "+" => 1,
                "-" => -1,
                _ => a_part.parse::<i64>().ok()?,
            };
            let b = if b_part.is_empty() {
                0
            } else {
                b_part.trim_start_matches('+').parse::<i64>().ok()?
            };
            Some(NthChildSelector::AnPlusB(a, b))
        }
        exact => exact
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(NthChildSelector::Exact),
    }
}

fn is_selector_continuation(next: u8) -> bool {
    matches!(next, b'.' | b'#' | b'[' | b':')
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    if start >= bytes.len() || !is_selector_ident_char(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80
}

fn parse_selector_attr_condition(
    src: &str,
    open_bracket: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let close = src[open_bracket..]
        .find(']')
        .map(|offset| open_bracket + offset)
        .ok_or_else(|| invalid_selector(src))?;
    let body = src[open_bracket + 1..close].trim();

    let operators = ["^=", "$=", "*=", "~=", "|=", "="];
    let Some((op, op_pos)) = operators
        .iter()
        .filter_map(|op| body.find(op).map(|pos| (*op, pos)))
        .min_by_key(|(_, pos)| *pos)
    else {
        if body.is_empty() || !body.bytes().all(|b| is_selector_ident_char(b) || b == b':') {
            return Err(invalid_selector(src));
        }
        return Ok((
            SelectorAttrCondition::Exists {
                key: body.to_ascii_lowercase(),
            },
            close + 1,
        ));
    };

    let key = body[..op_pos].trim().to_ascii_lowercase();
    if key.is_empty() {
        return Err(invalid_selector(src));
    }
    let raw_value = body[op_pos + op.len()..].trim();
    let value = raw_value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| {
            raw_value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
        })
        .unwrap_or(raw_value)
        .to_string();

    let cond = match op {
        "=" => SelectorAttrCondition::Eq { key, value },
        "^=" => SelectorAttrCondition::StartsWith { key, value },
        "$=" => SelectorAttrCondition::EndsWith { key, value },
        "*=" => SelectorAttrCondition::Contains { key, value },
        "~=" => SelectorAttrCondition::Includes { key, value },
        _ => SelectorAttrCondition::DashMatch { key, value },
    };
    Ok((cond, close + 1))
}
