use super::*;

/// The virtual keyboard between atom calls: keys held down and the caret
/// of the last edited control.
///
/// Releasing a key that is not held fails and leaves the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyboardDeviceState {
    pub held_keys: BTreeSet<KeyId>,
    pub caret: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Press(KeyId),
    Release(KeyId),
}

impl KeyboardDeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: KeyId) -> bool {
        self.held_keys.contains(&key)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            shift: self.is_held(KeyId::Shift),
            ctrl: self.is_held(KeyId::Control),
            alt: self.is_held(KeyId::Alt),
            meta: self.is_held(KeyId::Meta),
        }
    }

    /// Presses `key` with `target` focused: `keydown`, then for printable
    /// keys `keypress` and the edit, `textInput` and `input`.
    pub fn press(&mut self, doc: &mut Document, target: NodeId, key: KeyId) -> Result<()> {
        if key.is_modifier() && self.is_held(key) {
            return Err(Error::InvalidElementState(
                "Cannot press a modifier key that is already pressed.".into(),
            ));
        }
        doc.ensure_ready_for_input(target)?;
        doc.trace_device(format!(
            "[keyboard] press key={} target={}",
            key.dom_key(self.modifiers().shift),
            doc.trace_node_label(target)
        ));

        self.held_keys.insert(key);
        let modifiers = self.modifiers();
        let keydown = doc.dispatch_keyboard_event(target, "keydown", self.key_init(key, None))?;
        if keydown.default_prevented || key.is_modifier() {
            return self.sync_caret(doc, target);
        }

        if modifiers.ctrl || modifiers.meta {
            if key == KeyId::Char('a') && accepts_text(doc, target) {
                let host = editing_host(&doc.dom, target);
                with_edit(doc, target, host, |dom, host| {
                    dom.set_selection_range(host, 0, usize::MAX)
                })?;
            }
            return self.sync_caret(doc, target);
        }
        if modifiers.alt {
            return self.sync_caret(doc, target);
        }

        match key {
            KeyId::Backspace | KeyId::Delete => self.delete(doc, target, key == KeyId::Backspace)?,
            KeyId::Left | KeyId::Right | KeyId::Home | KeyId::End => {
                self.move_caret(doc, target, key, modifiers.shift)?
            }
            KeyId::Enter => self.enter(doc, target)?,
            _ => {
                if let Some(ch) = key.descriptor().char_for(modifiers.shift) {
                    self.type_char(doc, target, key, ch)?;
                }
            }
        }
        self.sync_caret(doc, target)
    }

    /// Releases a held key with `keyup`. Space released on a button or a
    /// checkable input clicks it.
    pub fn release(&mut self, doc: &mut Document, target: NodeId, key: KeyId) -> Result<()> {
        if !self.is_held(key) {
            return Err(Error::InvalidElementState(format!(
                "Cannot release a key that is not pressed. ({})",
                key.descriptor().key_code
            )));
        }
        doc.ensure_ready_for_input(target)?;
        doc.trace_device(format!(
            "[keyboard] release key={} target={}",
            key.dom_key(self.modifiers().shift),
            doc.trace_node_label(target)
        ));

        self.held_keys.remove(&key);
        let keyup = doc.dispatch_keyboard_event(target, "keyup", self.key_init(key, None))?;
        if key == KeyId::Space
            && !keyup.default_prevented
            && matches!(
                ElementKind::of(&doc.dom, target),
                ElementKind::Button | ElementKind::Checkable
            )
        {
            doc.click_node(target)?;
        }
        self.sync_caret(doc, target)
    }

    /// Releases every held key, modifiers included.
    pub fn release_all(&mut self, doc: &mut Document, target: NodeId) -> Result<()> {
        for key in self.held_keys.clone() {
            self.release(doc, target, key)?;
        }
        Ok(())
    }

    /// Types `keys` into `target`, focusing it first. Modifier code points
    /// toggle their key; characters are pressed and released one by one.
    /// Held keys are released at the end unless `persist_modifiers` is set.
    ///
    /// The whole sequence is checked against the held keys before the first
    /// event fires.
    pub fn type_keys(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        keys: &str,
        persist_modifiers: bool,
    ) -> Result<()> {
        let actions =
            plan_key_actions(&self.held_keys, &parse_key_sequence(keys), persist_modifiers)?;
        doc.ensure_ready_for_input(target)?;

        let focus_target = editing_host(&doc.dom, target);
        if doc.dom.active_element() != Some(focus_target) {
            doc.focus_node(focus_target)?;
        }

        if ElementKind::of(&doc.dom, target) == ElementKind::DirectAssign {
            return self.assign_directly(doc, target, keys, &actions);
        }

        for action in actions {
            match action {
                KeyAction::Press(key) => self.press(doc, target, key)?,
                KeyAction::Release(key) => self.release(doc, target, key)?,
            }
        }
        Ok(())
    }

    /// Fails when `keys` would press a held modifier or release a key that
    /// is not held. Nothing is dispatched.
    pub fn check_sequence(&self, keys: &str, persist_modifiers: bool) -> Result<()> {
        plan_key_actions(&self.held_keys, &parse_key_sequence(keys), persist_modifiers)?;
        Ok(())
    }

    /// Date, time, color and range inputs reject typed text; their value is
    /// assigned whole from the literal characters.
    fn assign_directly(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        keys: &str,
        actions: &[KeyAction],
    ) -> Result<()> {
        let text = keys
            .chars()
            .filter(|ch| !(0xE000..=0xE03D).contains(&u32::from(*ch)))
            .collect::<String>();
        if doc.dom.value(target)? != text {
            doc.dom.set_value(target, &text)?;
            doc.dispatch_input_event(target, "input", Some(&text), "insertReplacementText")?;
            doc.dispatch_event(target, "change")?;
        }
        for action in actions {
            match action {
                KeyAction::Press(key) if key.is_modifier() => {
                    self.held_keys.insert(*key);
                }
                KeyAction::Release(key) => {
                    self.held_keys.remove(key);
                }
                KeyAction::Press(_) => {}
            }
        }
        self.sync_caret(doc, target)
    }

    fn type_char(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        key: KeyId,
        ch: char,
    ) -> Result<()> {
        let keypress =
            doc.dispatch_keyboard_event(target, "keypress", self.key_init(key, Some(ch)))?;
        if keypress.default_prevented || !accepts_text(doc, target) {
            return Ok(());
        }
        let host = editing_host(&doc.dom, target);
        if exceeds_max_length(&doc.dom, host)? {
            return Ok(());
        }
        let data = ch.to_string();
        with_edit(doc, target, host, |dom, host| {
            dom.replace_selection(host, &data)
        })?;
        let input_type = if ch == '\n' {
            "insertLineBreak"
        } else {
            "insertText"
        };
        doc.dispatch_input_event(target, "textInput", Some(&data), input_type)?;
        doc.dispatch_input_event(target, "input", Some(&data), input_type)?;
        Ok(())
    }

    fn enter(&mut self, doc: &mut Document, target: NodeId) -> Result<()> {
        let host = editing_host(&doc.dom, target);
        let multiline = doc.dom.has_tag(host, "textarea") || is_content_editable(&doc.dom, host);
        if multiline {
            return self.type_char(doc, target, KeyId::Enter, '\n');
        }
        let init = self.key_init(KeyId::Enter, Some('\r'));
        let keypress = doc.dispatch_keyboard_event(target, "keypress", init)?;
        if keypress.default_prevented {
            return Ok(());
        }
        let kind = ElementKind::of(&doc.dom, target);
        let is_link = doc.dom.has_tag(target, "a") && doc.dom.has_attr(target, "href");
        if kind == ElementKind::Button || is_link {
            doc.click_node(target)?;
        } else if doc.dom.has_tag(target, "input") && kind.accepts_keys() {
            doc.implicit_submit(target)?;
        }
        Ok(())
    }

    fn delete(&mut self, doc: &mut Document, target: NodeId, backward: bool) -> Result<()> {
        if !accepts_text(doc, target) {
            return Ok(());
        }
        let host = editing_host(&doc.dom, target);
        let changed = with_edit(doc, target, host, |dom, host| {
            dom.delete_at_caret(host, backward)
        })?;
        if changed {
            let input_type = if backward {
                "deleteContentBackward"
            } else {
                "deleteContentForward"
            };
            doc.dispatch_input_event(target, "input", None, input_type)?;
        }
        Ok(())
    }

    /// Left and Right collapse a selection to its near edge instead of
    /// moving; with shift held they extend it.
    fn move_caret(
        &mut self,
        doc: &mut Document,
        target: NodeId,
        key: KeyId,
        shift: bool,
    ) -> Result<()> {
        if !ElementKind::of(&doc.dom, target).accepts_keys() {
            return Ok(());
        }
        let host = editing_host(&doc.dom, target);
        with_edit(doc, target, host, |dom, host| {
            let (start, end) = dom.selection_range(host)?;
            let len = char_len(&dom.value(host)?);
            let (start, end) = match (key, shift) {
                (KeyId::Left, true) => (start.saturating_sub(1), end),
                (KeyId::Right, true) => (start, (end + 1).min(len)),
                (KeyId::Home, true) => (0, end),
                (KeyId::End, true) => (start, len),
                (KeyId::Left, false) if start != end => (start, start),
                (KeyId::Right, false) if start != end => (end, end),
                (KeyId::Left, false) => {
                    let caret = start.saturating_sub(1);
                    (caret, caret)
                }
                (KeyId::Right, false) => {
                    let caret = (end + 1).min(len);
                    (caret, caret)
                }
                (KeyId::Home, false) => (0, 0),
                _ => (len, len),
            };
            dom.set_selection_range(host, start, end)
        })
    }

    fn key_init(&self, key: KeyId, typed: Option<char>) -> KeyboardEventInit {
        let modifiers = self.modifiers();
        let descriptor = key.descriptor();
        let char_code = typed.map(u32::from).unwrap_or(0);
        KeyboardEventInit {
            key: key.dom_key(modifiers.shift),
            code: descriptor.code.to_string(),
            key_code: if typed.is_some() {
                char_code
            } else {
                descriptor.key_code
            },
            char_code,
            modifiers,
        }
    }

    fn sync_caret(&mut self, doc: &Document, target: NodeId) -> Result<()> {
        if !doc.dom.is_connected(target) || !ElementKind::of(&doc.dom, target).accepts_keys() {
            return Ok(());
        }
        let host = editing_host(&doc.dom, target);
        self.caret = doc.dom.selection_range(host)?.1;
        Ok(())
    }
}

/// Expands typed tokens into presses and releases, checking each step
/// against the held keys without touching the document.
fn plan_key_actions(
    held: &BTreeSet<KeyId>,
    tokens: &[KeyToken],
    persist_modifiers: bool,
) -> Result<Vec<KeyAction>> {
    let mut held = held.clone();
    let mut actions = Vec::new();
    for token in tokens {
        let step = match *token {
            KeyToken::Key(key) if key.is_modifier() && held.contains(&key) => {
                vec![KeyAction::Release(key)]
            }
            KeyToken::Key(key) if key.is_modifier() => vec![KeyAction::Press(key)],
            KeyToken::Key(key) => vec![KeyAction::Press(key), KeyAction::Release(key)],
            KeyToken::Shifted(key) if held.contains(&KeyId::Shift) => {
                vec![KeyAction::Press(key), KeyAction::Release(key)]
            }
            KeyToken::Shifted(key) => vec![
                KeyAction::Press(KeyId::Shift),
                KeyAction::Press(key),
                KeyAction::Release(key),
                KeyAction::Release(KeyId::Shift),
            ],
            KeyToken::ReleaseAll => held
                .iter()
                .copied()
                .filter(|key| key.is_modifier())
                .map(KeyAction::Release)
                .collect(),
        };
        for action in &step {
            apply_action(&mut held, *action)?;
        }
        actions.extend(step);
    }
    if !persist_modifiers {
        actions.extend(held.iter().copied().map(KeyAction::Release));
    }
    Ok(actions)
}

fn apply_action(held: &mut BTreeSet<KeyId>, action: KeyAction) -> Result<()> {
    match action {
        KeyAction::Press(key) if key.is_modifier() && held.contains(&key) => {
            Err(Error::InvalidElementState(
                "Cannot press a modifier key that is already pressed.".into(),
            ))
        }
        KeyAction::Press(key) => {
            held.insert(key);
            Ok(())
        }
        KeyAction::Release(key) if !held.remove(&key) => Err(Error::InvalidElementState(format!(
            "Cannot release a key that is not pressed. ({})",
            key.descriptor().key_code
        ))),
        KeyAction::Release(_) => Ok(()),
    }
}

fn accepts_text(doc: &Document, target: NodeId) -> bool {
    let host = editing_host(&doc.dom, target);
    ElementKind::of(&doc.dom, target) == ElementKind::TextEditable
        && !is_readonly(&doc.dom, host)
        && !is_effectively_disabled(&doc.dom, host)
}

/// The node whose value an edit changes: the control itself, or the
/// outermost `contenteditable` element around `target`.
fn editing_host(dom: &Dom, target: NodeId) -> NodeId {
    if is_form_control(dom, target) || !is_content_editable(dom, target) {
        return target;
    }
    std::iter::once(target)
        .chain(dom.ancestors(target))
        .take_while(|node| dom.element(*node).is_some() && is_content_editable(dom, *node))
        .last()
        .unwrap_or(target)
}

/// Runs `edit` against the host's value. Content-editable hosts mirror
/// their flattened text into the value, with the caret starting after
/// `target`; the resulting change is spliced back into the text nodes.
fn with_edit<R>(
    doc: &mut Document,
    target: NodeId,
    host: NodeId,
    edit: impl FnOnce(&mut Dom, NodeId) -> Result<R>,
) -> Result<R> {
    if is_form_control(&doc.dom, host) {
        return edit(&mut doc.dom, host);
    }
    let text = doc.dom.text_content(host);
    let caret = doc.dom.text_offset_after(host, target);
    if let Some(element) = doc.dom.element_mut(host) {
        if element.value != text {
            element.value = text;
            element.selection_start = caret;
            element.selection_end = caret;
        }
    }
    let before = doc.dom.value(host)?;
    let (selection_start, _) = doc.dom.selection_range(host)?;

    let out = edit(&mut doc.dom, host)?;

    let after = doc.dom.value(host)?;
    if after != before {
        let (caret, _) = doc.dom.selection_range(host)?;
        let start = selection_start.min(caret);
        let inserted = caret - start;
        let removed = (char_len(&before) + inserted).saturating_sub(char_len(&after));
        let text = after
            .chars()
            .skip(start)
            .take(inserted)
            .collect::<String>();
        let within = if doc.dom.is_descendant_of(target, host) {
            target
        } else {
            host
        };
        doc.dom.splice_text(host, within, start, start + removed, &text);
    }
    Ok(out)
}

fn exceeds_max_length(dom: &Dom, host: NodeId) -> Result<bool> {
    let Some(max) = dom
        .attr(host, "maxlength")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
    else {
        return Ok(false);
    };
    let (start, end) = dom.selection_range(host)?;
    Ok(start == end && char_len(&dom.value(host)?) >= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::special;
    use std::cell::RefCell;

    fn count_events(
        doc: &mut Document,
        node: NodeId,
        event_type: &'static str,
    ) -> Rc<RefCell<usize>> {
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        doc.add_event_listener(node, event_type, false, move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        count
    }

    #[test]
    fn typing_fires_input_per_character() -> Result<()> {
        let mut doc = Document::from_html("<input id='i'>")?;
        let input = doc.select_one("#i")?;
        let inputs = count_events(&mut doc, input, "input");
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, input, "ab", false)?;
        assert_eq!(doc.value(input)?, "ab");
        assert_eq!(*inputs.borrow(), 2);
        assert_eq!(keyboard.caret, 2);
        assert!(keyboard.held_keys.is_empty());
        Ok(())
    }

    #[test]
    fn backspace_removes_the_previous_character() -> Result<()> {
        let mut doc = Document::from_html("<input id='i'>")?;
        let input = doc.select_one("#i")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, input, &format!("a{}", special::BACKSPACE), false)?;
        assert_eq!(doc.value(input)?, "");
        assert_eq!(keyboard.caret, 0);
        Ok(())
    }

    #[test]
    fn left_collapses_a_selection_to_its_start() -> Result<()> {
        let mut doc = Document::from_html("<input id='i' value='hello'>")?;
        let input = doc.select_one("#i")?;
        doc.dom.set_selection_range(input, 1, 4)?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, input, &special::LEFT.to_string(), false)?;
        assert_eq!(doc.dom.selection_range(input)?, (1, 1));
        keyboard.type_keys(&mut doc, input, &special::LEFT.to_string(), false)?;
        assert_eq!(doc.dom.selection_range(input)?, (0, 0));
        Ok(())
    }

    #[test]
    fn releasing_an_unheld_key_changes_nothing() -> Result<()> {
        let mut doc = Document::from_html("<input id='i'>")?;
        let input = doc.select_one("#i")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.press(&mut doc, input, KeyId::Shift)?;
        let keyups = count_events(&mut doc, input, "keyup");
        let before = keyboard.clone();
        assert!(keyboard.release(&mut doc, input, KeyId::Alt).is_err());
        assert_eq!(keyboard, before);
        assert_eq!(*keyups.borrow(), 0);
        assert!(keyboard.press(&mut doc, input, KeyId::Shift).is_err());
        Ok(())
    }

    #[test]
    fn persisted_shift_uppercases_later_calls() -> Result<()> {
        let mut doc = Document::from_html("<input id='i'>")?;
        let input = doc.select_one("#i")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, input, &format!("{}a", special::SHIFT), true)?;
        assert!(keyboard.is_held(KeyId::Shift));
        keyboard.type_keys(&mut doc, input, "b", false)?;
        assert_eq!(doc.value(input)?, "AB");
        assert!(keyboard.held_keys.is_empty());
        Ok(())
    }

    #[test]
    fn enter_in_textarea_inserts_a_newline() -> Result<()> {
        let mut doc = Document::from_html("<textarea id='t'>ab</textarea>")?;
        let textarea = doc.select_one("#t")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, textarea, "\nc", false)?;
        assert_eq!(doc.value(textarea)?, "ab\nc");
        Ok(())
    }

    #[test]
    fn enter_in_lone_field_submits_its_form() -> Result<()> {
        let mut doc = Document::from_html("<form id='f'><input id='q'></form>")?;
        let q = doc.select_one("#q")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, q, "x\n", false)?;
        assert_eq!(doc.submissions().len(), 1);
        Ok(())
    }

    #[test]
    fn prevented_keypress_blocks_the_edit() -> Result<()> {
        let mut doc = Document::from_html("<input id='i'>")?;
        let input = doc.select_one("#i")?;
        doc.add_event_listener(input, "keypress", false, |_, event| {
            if event.keyboard().is_some_and(|init| init.key == "x") {
                event.prevent_default();
            }
            Ok(())
        });
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, input, "axb", false)?;
        assert_eq!(doc.value(input)?, "ab");
        Ok(())
    }

    #[test]
    fn content_editable_text_is_edited_in_place() -> Result<()> {
        let mut doc = Document::from_html("<div id='e' contenteditable>hi</div>")?;
        let editor = doc.select_one("#e")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, editor, "!", false)?;
        assert_eq!(doc.text_content(editor)?, "hi!");
        assert_eq!(keyboard.caret, 3);
        Ok(())
    }

    #[test]
    fn typing_into_a_nested_element_keeps_it_attached() -> Result<()> {
        let mut doc =
            Document::from_html("<div id='e' contenteditable>hi<p id='t'>there</p></div>")?;
        let editor = doc.select_one("#e")?;
        let paragraph = doc.select_one("#t")?;
        let inputs = count_events(&mut doc, paragraph, "input");
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, paragraph, "ab", false)?;
        assert_eq!(doc.select_one("#t")?, paragraph);
        assert_eq!(doc.text_content(paragraph)?, "thereab");
        assert_eq!(doc.text_content(editor)?, "hithereab");
        assert_eq!(*inputs.borrow(), 2);
        assert_eq!(keyboard.caret, 9);
        Ok(())
    }

    #[test]
    fn markup_inside_the_editing_host_survives_edits() -> Result<()> {
        let mut doc =
            Document::from_html("<div id='e' contenteditable>hi <b id='b'>bold</b></div>")?;
        let editor = doc.select_one("#e")?;
        let bold = doc.select_one("#b")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, editor, "!", false)?;
        assert_eq!(doc.text_content(editor)?, "hi bold!");
        assert_eq!(doc.select_one("#b")?, bold);
        assert_eq!(doc.text_content(bold)?, "bold!");
        Ok(())
    }

    #[test]
    fn backspace_crosses_element_boundaries_without_removing_them() -> Result<()> {
        let mut doc = Document::from_html("<div id='e' contenteditable>ab<i id='i'>c</i></div>")?;
        let editor = doc.select_one("#e")?;
        let italic = doc.select_one("#i")?;
        let mut keyboard = KeyboardDeviceState::new();
        let keys = format!("{0}{0}", special::BACKSPACE);
        keyboard.type_keys(&mut doc, editor, &keys, false)?;
        assert_eq!(doc.text_content(editor)?, "a");
        assert_eq!(doc.select_one("#i")?, italic);
        assert_eq!(doc.text_content(italic)?, "");
        assert_eq!(keyboard.caret, 1);
        Ok(())
    }

    #[test]
    fn empty_nested_target_receives_the_typed_text() -> Result<()> {
        let mut doc =
            Document::from_html("<div id='e' contenteditable>hi<span id='s'></span>!</div>")?;
        let editor = doc.select_one("#e")?;
        let span = doc.select_one("#s")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, span, "xy", false)?;
        assert_eq!(doc.text_content(span)?, "xy");
        assert_eq!(doc.text_content(editor)?, "hixy!");
        Ok(())
    }

    #[test]
    fn date_inputs_take_the_value_whole() -> Result<()> {
        let mut doc = Document::from_html("<input id='d' type='date'>")?;
        let date = doc.select_one("#d")?;
        let keydowns = count_events(&mut doc, date, "keydown");
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, date, "2024-02-29", false)?;
        assert_eq!(doc.value(date)?, "2024-02-29");
        assert_eq!(*keydowns.borrow(), 0);
        Ok(())
    }

    #[test]
    fn maxlength_caps_typed_text() -> Result<()> {
        let mut doc = Document::from_html("<input id='i' maxlength='2'>")?;
        let input = doc.select_one("#i")?;
        let mut keyboard = KeyboardDeviceState::new();
        keyboard.type_keys(&mut doc, input, "abc", false)?;
        assert_eq!(doc.value(input)?, "ab");
        Ok(())
    }
}
