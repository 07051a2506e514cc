use super::*;

const TEXT_ENTRY_INPUT_TYPES: &[&str] = &[
    "text", "search", "url", "tel", "email", "password", "number",
];

const DIRECT_ASSIGN_INPUT_TYPES: &[&str] = &[
    "date",
    "time",
    "datetime-local",
    "month",
    "week",
    "color",
    "range",
];

pub(crate) fn is_form_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    element.is_tag("input")
        || element.is_tag("select")
        || element.is_tag("textarea")
        || element.is_tag("button")
}

/// Lowercased `type` of an input; missing or unknown types read as `text`.
pub(crate) fn input_type(element: &Element) -> String {
    element
        .attrs
        .get("type")
        .map(|kind| kind.trim().to_ascii_lowercase())
        .filter(|kind| !kind.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

fn is_input_of_type(dom: &Dom, node_id: NodeId, kind: &str) -> bool {
    dom.element(node_id)
        .is_some_and(|element| element.is_tag("input") && input_type(element) == kind)
}

pub(crate) fn is_checkbox_input(dom: &Dom, node_id: NodeId) -> bool {
    is_input_of_type(dom, node_id, "checkbox")
}

pub(crate) fn is_radio_input(dom: &Dom, node_id: NodeId) -> bool {
    is_input_of_type(dom, node_id, "radio")
}

pub(crate) fn is_hidden_input(dom: &Dom, node_id: NodeId) -> bool {
    is_input_of_type(dom, node_id, "hidden")
}

pub(crate) fn is_checkbox_or_radio_input_element(element: &Element) -> bool {
    element.is_tag("input") && matches!(input_type(element).as_str(), "checkbox" | "radio")
}

pub(crate) fn is_submit_control(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };

    if element.is_tag("button") {
        return element
            .attrs
            .get("type")
            .map(|kind| kind.eq_ignore_ascii_case("submit"))
            .unwrap_or(true);
    }

    element.is_tag("input") && matches!(input_type(element).as_str(), "submit" | "image")
}

/// Controls whose value is edited character by character.
pub(crate) fn is_text_entry(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };
    element.is_tag("textarea")
        || (element.is_tag("input")
            && TEXT_ENTRY_INPUT_TYPES.contains(&input_type(element).as_str()))
}

/// Inputs whose value is assigned wholesale instead of typed.
pub(crate) fn is_direct_assign_input(dom: &Dom, node_id: NodeId) -> bool {
    dom.element(node_id).is_some_and(|element| {
        element.is_tag("input") && DIRECT_ASSIGN_INPUT_TYPES.contains(&input_type(element).as_str())
    })
}

pub(crate) fn is_content_editable(dom: &Dom, node_id: NodeId) -> bool {
    std::iter::once(node_id)
        .chain(dom.ancestors(node_id))
        .find_map(|node| dom.attr(node, "contenteditable"))
        .is_some_and(|value| !value.eq_ignore_ascii_case("false"))
}

pub(crate) fn is_readonly(dom: &Dom, node_id: NodeId) -> bool {
    dom.has_attr(node_id, "readonly")
}

/// `disabled` on the node itself, on an owning select/optgroup for options,
/// or on an ancestor fieldset unless the node sits inside that fieldset's
/// first legend.
pub(crate) fn is_effectively_disabled(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };
    let disableable = is_form_control(dom, node_id)
        || element.is_tag("option")
        || element.is_tag("optgroup")
        || element.is_tag("fieldset");
    if !disableable {
        return false;
    }
    if element.attrs.contains_key("disabled") {
        return true;
    }
    if element.is_tag("option") {
        if let Some(parent) = dom.parent_element(node_id) {
            if dom.has_tag(parent, "optgroup") && dom.has_attr(parent, "disabled") {
                return true;
            }
        }
        return dom
            .owning_select(node_id)
            .is_some_and(|select| is_effectively_disabled(dom, select));
    }

    let mut child = node_id;
    for ancestor in dom.ancestors(node_id) {
        if dom.has_tag(ancestor, "fieldset") && dom.has_attr(ancestor, "disabled") {
            let first_legend = dom
                .element_children(ancestor)
                .into_iter()
                .find(|node| dom.has_tag(*node, "legend"));
            if first_legend != Some(child) {
                return true;
            }
        }
        child = ancestor;
    }
    false
}

pub(crate) fn form_owner(dom: &Dom, node_id: NodeId) -> Option<NodeId> {
    if let Some(form_id) = dom.attr(node_id, "form") {
        return dom.by_id(&form_id).filter(|node| dom.has_tag(*node, "form"));
    }
    dom.find_ancestor_by_tag(node_id, "form")
}

pub(crate) fn form_elements(dom: &Dom, form: NodeId) -> Vec<NodeId> {
    dom.all_element_nodes()
        .into_iter()
        .filter(|node| is_form_control(dom, *node) && form_owner(dom, *node) == Some(form))
        .collect()
}

/// First submit control of the form in tree order.
pub(crate) fn default_submit_button(dom: &Dom, form: NodeId) -> Option<NodeId> {
    form_elements(dom, form)
        .into_iter()
        .find(|node| is_submit_control(dom, *node))
}

/// Fields that block implicit submission when the form has no submit button.
pub(crate) fn implicit_submission_blockers(dom: &Dom, form: NodeId) -> usize {
    form_elements(dom, form)
        .into_iter()
        .filter(|node| dom.has_tag(*node, "input") && is_text_entry(dom, *node))
        .count()
}

/// Elements a mouse press or a keyboard target can move focus to.
pub(crate) fn is_focusable(dom: &Dom, node_id: NodeId) -> bool {
    let Some(element) = dom.element(node_id) else {
        return false;
    };
    if is_form_control(dom, node_id) {
        return !is_hidden_input(dom, node_id) && !is_effectively_disabled(dom, node_id);
    }
    if (element.is_tag("a") || element.is_tag("area")) && element.attrs.contains_key("href") {
        return true;
    }
    element.attrs.contains_key("tabindex")
        || element.is_tag("iframe")
        || (is_content_editable(dom, node_id)
            && !dom
                .parent_element(node_id)
                .is_some_and(|parent| is_content_editable(dom, parent)))
}
