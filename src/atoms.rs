//! The automation atoms: each runs to completion against one document.
//!
//! Device state is explicit. [`click`] and [`send_keys`] take the state a
//! previous call returned (or `None` for a fresh device) and return the
//! updated state, so independent sessions never share input state.
//!
//! Listeners run synchronously inside an atom and may change the document
//! while a sequence is in flight; the atoms do not guard against that.

use crate::core_impl::{is_effectively_disabled, is_form_control, is_readonly};
use crate::{
    ClipState, Document, ElementKind, Error, KeyboardDeviceState, Locator, MouseButton,
    MouseDeviceState, NodeId, Reason, Result,
};

const ACTION_STACK_BYTES: usize = 32 * 1024 * 1024;

/// Scrolls `element` into view when only scrolling hides it, then checks
/// that it is displayed.
fn prepare_for_interaction(doc: &mut Document, element: NodeId) -> Result<()> {
    doc.ensure_ready_for_input(element)?;
    let mut verdict = doc.interactability(element)?;
    if verdict.reason == Some(Reason::ClippedScrollable) {
        doc.scroll_into_view(element)?;
        verdict = doc.interactability(element)?;
    }
    if !verdict.displayed {
        tracing::debug!(element = %element, reason = ?verdict.reason, "element not interactable");
        return Err(Error::ElementNotInteractable(
            "Element is not currently visible and may not be manipulated".into(),
        ));
    }
    Ok(())
}

/// Moves the mouse to the center of `element` and clicks the primary
/// button.
pub fn click(
    doc: &mut Document,
    element: NodeId,
    prior: Option<MouseDeviceState>,
) -> Result<MouseDeviceState> {
    stacker::grow(ACTION_STACK_BYTES, || {
        let mut mouse = prior.unwrap_or_default();
        if mouse.pressed_button.is_some() {
            return Err(Error::InvalidElementState(
                "Cannot press more than one button or an already pressed button.".into(),
            ));
        }
        prepare_for_interaction(doc, element)?;
        mouse.move_to(doc, element, None)?;
        mouse.press(doc, MouseButton::Primary)?;
        mouse.release(doc, MouseButton::Primary)?;
        Ok(mouse)
    })
}

/// Types `keys` into `element`. Literal characters are pressed and
/// released one at a time; WebDriver special-key code points map to their
/// keys, with modifiers toggled. Unless `persist_modifiers` is set every
/// key is released at the end.
pub fn send_keys(
    doc: &mut Document,
    element: NodeId,
    keys: &str,
    prior: Option<KeyboardDeviceState>,
    persist_modifiers: bool,
) -> Result<KeyboardDeviceState> {
    stacker::grow(ACTION_STACK_BYTES, || {
        let mut keyboard = prior.unwrap_or_default();
        keyboard.check_sequence(keys, persist_modifiers)?;
        prepare_for_interaction(doc, element)?;
        if is_effectively_disabled(&doc.dom, element) {
            return Err(Error::ElementNotInteractable(
                "Element is not currently interactable and may not be manipulated".into(),
            ));
        }
        keyboard.type_keys(doc, element, keys, persist_modifiers)?;
        Ok(keyboard)
    })
}

/// Empties an editable element by direct assignment and fires `change`
/// when the value changed.
pub fn clear(doc: &mut Document, element: NodeId) -> Result<()> {
    stacker::grow(ACTION_STACK_BYTES, || {
        doc.ensure_ready_for_input(element)?;
        let kind = ElementKind::of(&doc.dom, element);
        let editable = kind.accepts_keys()
            && !is_readonly(&doc.dom, element)
            && !is_effectively_disabled(&doc.dom, element);
        if !editable {
            return Err(Error::InvalidElementState(
                "Element must be user-editable in order to clear it.".into(),
            ));
        }
        prepare_for_interaction(doc, element)?;
        if doc.dom.active_element() != Some(element) {
            doc.focus_node(element)?;
        }

        let form_control = is_form_control(&doc.dom, element);
        let current = if form_control {
            doc.dom.value(element)?
        } else {
            doc.dom.text_content(element)
        };
        if current.is_empty() {
            return Ok(());
        }
        if form_control {
            doc.dom.set_value(element, "")?;
        } else {
            doc.dom.set_text_content(element, "")?;
        }
        doc.dispatch_input_event(element, "input", None, "deleteContent")?;
        doc.dispatch_event(element, "change")?;
        Ok(())
    })
}

/// Scrolls `element` into view. Fails when something other than a
/// scrollable ancestor still hides it.
pub fn scroll_into_view(doc: &mut Document, element: NodeId) -> Result<()> {
    match doc.scroll_into_view(element)? {
        ClipState::None => Ok(()),
        state => Err(Error::ElementNotInteractable(format!(
            "Element could not be scrolled into view ({state:?})"
        ))),
    }
}

/// Displayed and enabled, with nothing clipping it.
pub fn is_interactable(doc: &Document, element: NodeId) -> Result<bool> {
    Ok(doc.interactability(element)?.is_interactable())
}

/// Rendered text of `element`.
pub fn get_visible_text(doc: &Document, element: NodeId) -> Result<String> {
    doc.ensure_attached(element)?;
    Ok(doc.visible_text(element))
}

/// Focused element, else `<body>`.
pub fn active_element(doc: &Document) -> NodeId {
    doc.active_element()
}

/// First element matching `locator` under `root` (the whole document by
/// default).
pub fn find_element(
    doc: &mut Document,
    locator: &Locator,
    root: Option<NodeId>,
) -> Result<NodeId> {
    let found = find_with_wait(doc, locator, root)?;
    match found.first() {
        Some(node) => Ok(*node),
        None if doc.config.implicit_wait_ms > 0 => Err(Error::Timeout(format!(
            "Timed out after {} ms waiting for element: {locator}",
            doc.config.implicit_wait_ms
        ))),
        None => Err(Error::NoSuchElement(format!(
            "Unable to locate element: {locator}"
        ))),
    }
}

/// Every element matching `locator` under `root`, in document order.
pub fn find_elements(
    doc: &mut Document,
    locator: &Locator,
    root: Option<NodeId>,
) -> Result<Vec<NodeId>> {
    find_with_wait(doc, locator, root)
}

/// Queries once, and once more after the implicit wait elapses on the
/// virtual clock.
fn find_with_wait(
    doc: &mut Document,
    locator: &Locator,
    root: Option<NodeId>,
) -> Result<Vec<NodeId>> {
    let found = query(doc, locator, root)?;
    let wait_ms = doc.config.implicit_wait_ms;
    if !found.is_empty() || wait_ms == 0 {
        return Ok(found);
    }
    doc.advance_time(i64::try_from(wait_ms).unwrap_or(i64::MAX))?;
    query(doc, locator, root)
}

fn query(doc: &Document, locator: &Locator, root: Option<NodeId>) -> Result<Vec<NodeId>> {
    let root = match root {
        Some(root) => {
            doc.ensure_attached(root)?;
            root
        }
        None => doc.root(),
    };
    let found = doc.resolver.resolve(doc, locator, root)?;
    tracing::trace!(%locator, matches = found.len(), "locator resolved");
    if !doc.config.require_displayed_matches {
        return Ok(found);
    }
    let layout = doc.layout();
    Ok(found
        .into_iter()
        .filter(|node| doc.verdict_in(&layout, *node).displayed)
        .collect())
}
