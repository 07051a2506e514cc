use super::*;

use crate::keys::special;

const KEY_EVENTS: &[&str] = &["keydown", "keypress", "input", "keyup", "change", "focus"];

#[test]
fn typing_focuses_then_fires_key_events_per_character() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let log = record_events(&mut doc, KEY_EVENTS)?;
    let input = doc.select_one("#q")?;

    let state = atoms::send_keys(&mut doc, input, "hi", None, false)?;

    assert_eq!(doc.value(input)?, "hi");
    assert_eq!(state.caret, 2);
    assert!(state.held_keys.is_empty());
    assert_eq!(
        logged(&log),
        vec![
            "focus #q",
            "keydown #q",
            "keypress #q",
            "input #q",
            "keyup #q",
            "keydown #q",
            "keypress #q",
            "input #q",
            "keyup #q",
        ]
    );
    Ok(())
}

#[test]
fn typing_inserts_at_the_caret() -> Result<()> {
    let mut doc = Document::from_html("<input id='q' value='ac'>")?;
    let input = doc.select_one("#q")?;
    doc.set_selection_range(input, 1, 1)?;
    doc.focus_node(input)?;
    atoms::send_keys(&mut doc, input, "b", None, false)?;
    assert_eq!(doc.value(input)?, "abc");
    assert_eq!(doc.selection_range(input)?, (2, 2));
    Ok(())
}

#[test]
fn uppercase_letters_are_typed_with_shift() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let input = doc.select_one("#q")?;
    let shifted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&shifted);
    doc.add_event_listener(input, "keypress", false, move |_, event| {
        if let Some(init) = event.keyboard() {
            sink.borrow_mut().push((init.key.clone(), init.modifiers.shift));
        }
        Ok(())
    });

    atoms::send_keys(&mut doc, input, "aB!", None, false)?;

    assert_eq!(doc.value(input)?, "aB!");
    assert_eq!(
        shifted.borrow().clone(),
        vec![
            ("a".to_string(), false),
            ("B".to_string(), true),
            ("!".to_string(), true),
        ]
    );
    Ok(())
}

#[test]
fn persisted_modifiers_carry_into_the_next_call() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let input = doc.select_one("#q")?;

    let state = atoms::send_keys(&mut doc, input, &special::SHIFT.to_string(), None, true)?;
    assert!(state.is_held(KeyId::Shift));

    let state = atoms::send_keys(&mut doc, input, "x", Some(state), false)?;
    assert_eq!(doc.value(input)?, "X");
    assert!(state.held_keys.is_empty());
    Ok(())
}

#[test]
fn null_key_releases_held_modifiers() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let input = doc.select_one("#q")?;
    let keys = format!("{}a{}b", special::SHIFT, special::NULL);
    let state = atoms::send_keys(&mut doc, input, &keys, None, true)?;
    assert_eq!(doc.value(input)?, "Ab");
    assert!(state.held_keys.is_empty());
    Ok(())
}

#[test]
fn backspace_and_arrows_edit_the_value() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let input = doc.select_one("#q")?;
    let keys = format!(
        "abcd{}{}{}x",
        special::BACKSPACE,
        special::LEFT,
        special::DELETE
    );
    let state = atoms::send_keys(&mut doc, input, &keys, None, false)?;
    assert_eq!(doc.value(input)?, "abx");
    assert_eq!(state.caret, 3);
    Ok(())
}

#[test]
fn select_all_then_type_replaces_the_value() -> Result<()> {
    let mut doc = Document::from_html("<input id='q' value='old text'>")?;
    let input = doc.select_one("#q")?;
    let keys = format!("{}a{}new", special::CONTROL, special::CONTROL);
    atoms::send_keys(&mut doc, input, &keys, None, false)?;
    assert_eq!(doc.value(input)?, "new");
    Ok(())
}

#[test]
fn enter_in_a_lone_text_field_submits_the_form() -> Result<()> {
    let mut doc = Document::from_html("<form id='f'><input id='q'></form>")?;
    let form = doc.select_one("#f")?;
    let input = doc.select_one("#q")?;
    atoms::send_keys(&mut doc, input, &format!("rust{}", special::ENTER), None, false)?;
    assert_eq!(doc.value(input)?, "rust");
    assert_eq!(doc.submissions().len(), 1);
    assert_eq!(doc.submissions()[0].form, form);
    assert_eq!(doc.submissions()[0].submitter, None);
    Ok(())
}

#[test]
fn enter_goes_through_the_default_button() -> Result<()> {
    let mut doc = Document::from_html(
        "<form id='f'><input id='a'><input id='b'><button id='go'>Go</button></form>",
    )?;
    let log = record_events(&mut doc, &["click", "submit"])?;
    let input = doc.select_one("#a")?;
    let button = doc.select_one("#go")?;
    atoms::send_keys(&mut doc, input, "\n", None, false)?;
    assert_eq!(logged(&log), vec!["click #go", "submit #f"]);
    assert_eq!(doc.submissions()[0].submitter, Some(button));
    Ok(())
}

#[test]
fn space_on_a_checkbox_toggles_it() -> Result<()> {
    let mut doc = Document::from_html("<input id='c' type='checkbox'>")?;
    let checkbox = doc.select_one("#c")?;
    atoms::send_keys(&mut doc, checkbox, " ", None, false)?;
    assert!(doc.checked(checkbox)?);
    Ok(())
}

#[test]
fn disabled_input_rejects_typing() -> Result<()> {
    let mut doc = Document::from_html("<input id='q' disabled>")?;
    let input = doc.select_one("#q")?;
    assert!(matches!(
        atoms::send_keys(&mut doc, input, "x", None, false),
        Err(Error::ElementNotInteractable(_))
    ));
    assert_eq!(doc.value(input)?, "");
    Ok(())
}

#[test]
fn readonly_input_takes_key_events_but_not_text() -> Result<()> {
    let mut doc = Document::from_html("<input id='q' readonly value='fixed'>")?;
    let log = record_events(&mut doc, &["keydown", "input"])?;
    let input = doc.select_one("#q")?;
    atoms::send_keys(&mut doc, input, "x", None, false)?;
    assert_eq!(doc.value(input)?, "fixed");
    assert_eq!(logged(&log), vec!["keydown #q"]);
    Ok(())
}

#[test]
fn releasing_an_unheld_modifier_fails_before_any_event() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let log = record_events(&mut doc, KEY_EVENTS)?;
    let input = doc.select_one("#q")?;
    let mut state = KeyboardDeviceState::new();
    match state.release(&mut doc, input, KeyId::Shift) {
        Err(Error::InvalidElementState(message)) => {
            assert_eq!(message, "Cannot release a key that is not pressed. (16)");
        }
        other => panic!("expected InvalidElementState, got: {other:?}"),
    }
    assert!(logged(&log).is_empty());
    Ok(())
}

#[test]
fn clear_empties_and_reports_change() -> Result<()> {
    let mut doc = Document::from_html("<input id='q' value='draft'>")?;
    let log = record_events(&mut doc, &["input", "change"])?;
    let input = doc.select_one("#q")?;
    atoms::clear(&mut doc, input)?;
    assert_eq!(doc.value(input)?, "");
    assert_eq!(logged(&log), vec!["input #q", "change #q"]);

    atoms::clear(&mut doc, input)?;
    assert_eq!(logged(&log).len(), 2);
    Ok(())
}

#[test]
fn clear_refuses_non_editable_elements() -> Result<()> {
    let mut doc = Document::from_html(
        "<p id='p'>text</p><input id='r' readonly value='x'><input id='d' disabled value='x'>",
    )?;
    for selector in ["#p", "#r", "#d"] {
        let node = doc.select_one(selector)?;
        match atoms::clear(&mut doc, node) {
            Err(Error::InvalidElementState(message)) => {
                assert_eq!(message, "Element must be user-editable in order to clear it.");
            }
            other => panic!("expected InvalidElementState for {selector}, got: {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn clear_empties_a_contenteditable_host() -> Result<()> {
    let mut doc = Document::from_html("<div id='e' contenteditable='true'>notes</div>")?;
    let host = doc.select_one("#e")?;
    atoms::clear(&mut doc, host)?;
    assert_eq!(doc.text_content(host)?, "");
    Ok(())
}
