use super::*;

const MOUSE_EVENTS: &[&str] = &[
    "mouseover",
    "mouseout",
    "mousemove",
    "mousedown",
    "mouseup",
    "click",
    "dblclick",
    "focus",
    "blur",
];

#[test]
fn click_on_a_link_moves_focus_between_press_and_release() -> Result<()> {
    let mut doc = Document::from_html("<a id='go' href='#next'>Next</a>")?;
    let log = record_events(&mut doc, MOUSE_EVENTS)?;
    let link = doc.select_one("#go")?;

    let state = atoms::click(&mut doc, link, None)?;

    assert_eq!(
        logged(&log),
        vec![
            "mouseover #go",
            "mousemove #go",
            "mousedown #go",
            "focus #go",
            "mouseup #go",
            "click #go",
        ]
    );
    assert_eq!(state.last_element, Some(link));
    assert_eq!(state.pressed_button, None);
    assert_eq!(doc.active_element(), link);
    Ok(())
}

#[test]
fn clicking_another_element_leaves_the_first() -> Result<()> {
    let mut doc = Document::from_html("<button id='a'>A</button><button id='b'>B</button>")?;
    let a = doc.select_one("#a")?;
    let b = doc.select_one("#b")?;
    let state = atoms::click(&mut doc, a, None)?;
    let log = record_events(&mut doc, MOUSE_EVENTS)?;

    atoms::click(&mut doc, b, Some(state))?;

    assert_eq!(
        logged(&log),
        vec![
            "mouseout #a",
            "mouseover #b",
            "mousemove #b",
            "mousedown #b",
            "blur #a",
            "focus #b",
            "mouseup #b",
            "click #b",
        ]
    );
    Ok(())
}

#[test]
fn second_click_within_the_window_fires_one_dblclick() -> Result<()> {
    let mut doc = Document::from_html("<div id='d' style='width: 50px; height: 20px'></div>")?;
    let log = record_events(&mut doc, &["click", "dblclick"])?;
    let div = doc.select_one("#d")?;

    let state = atoms::click(&mut doc, div, None)?;
    doc.advance_time(100)?;
    let state = atoms::click(&mut doc, div, Some(state))?;
    doc.advance_time(100)?;
    atoms::click(&mut doc, div, Some(state))?;

    assert_eq!(
        logged(&log),
        vec!["click #d", "click #d", "dblclick #d", "click #d"]
    );
    Ok(())
}

#[test]
fn fresh_state_never_double_clicks() -> Result<()> {
    let mut doc = Document::from_html("<button id='b'>b</button>")?;
    let log = record_events(&mut doc, &["dblclick"])?;
    let button = doc.select_one("#b")?;
    atoms::click(&mut doc, button, None)?;
    atoms::click(&mut doc, button, None)?;
    assert!(logged(&log).is_empty());
    Ok(())
}

#[test]
fn hidden_element_cannot_be_clicked() -> Result<()> {
    let mut doc = Document::from_html(
        "<div style='visibility: hidden'><button id='b'>b</button></div>",
    )?;
    let log = record_events(&mut doc, MOUSE_EVENTS)?;
    let button = doc.select_one("#b")?;
    match atoms::click(&mut doc, button, None) {
        Err(Error::ElementNotInteractable(message)) => {
            assert_eq!(
                message,
                "Element is not currently visible and may not be manipulated"
            );
        }
        other => panic!("expected ElementNotInteractable, got: {other:?}"),
    }
    assert!(logged(&log).is_empty());
    Ok(())
}

#[test]
fn click_scrolls_a_clipped_element_into_view_first() -> Result<()> {
    let mut doc = Document::from_html(
        r#"<div id='box' style='overflow: auto; width: 100px; height: 50px'>
             <div style='height: 300px'></div>
             <button id='b'>b</button>
           </div>"#,
    )?;
    let log = record_events(&mut doc, &["click"])?;
    let container = doc.select_one("#box")?;
    let button = doc.select_one("#b")?;
    assert_eq!(doc.clip_state(button)?, ClipState::Scroll);

    atoms::click(&mut doc, button, None)?;

    assert!(doc.scroll_offset(container)?.1 > 0.0);
    assert_eq!(doc.clip_state(button)?, ClipState::None);
    assert_eq!(logged(&log), vec!["click #b"]);
    Ok(())
}

#[test]
fn disabled_button_swallows_the_click() -> Result<()> {
    let mut doc = Document::from_html(
        "<form id='f'><button id='b' disabled>send</button></form>",
    )?;
    let log = record_events(&mut doc, &["mousedown", "mouseup", "click"])?;
    let button = doc.select_one("#b")?;
    atoms::click(&mut doc, button, None)?;
    assert_eq!(logged(&log), vec!["mousedown #b", "mouseup #b"]);
    assert!(doc.submissions().is_empty());
    Ok(())
}

#[test]
fn submit_button_click_submits_its_form() -> Result<()> {
    let mut doc = Document::from_html(
        "<form id='f'><input name='q'><button id='b'>send</button></form>",
    )?;
    let form = doc.select_one("#f")?;
    let button = doc.select_one("#b")?;
    doc.advance_time(42)?;
    atoms::click(&mut doc, button, None)?;
    assert_eq!(
        doc.submissions(),
        &[Submission {
            form,
            submitter: Some(button),
            time_ms: 42,
        }]
    );
    Ok(())
}

#[test]
fn prevented_click_skips_activation() -> Result<()> {
    let mut doc = Document::from_html("<input id='c' type='checkbox'>")?;
    let checkbox = doc.select_one("#c")?;
    doc.add_event_listener(checkbox, "click", false, |_, event| {
        event.prevent_default();
        Ok(())
    });
    atoms::click(&mut doc, checkbox, None)?;
    assert!(!doc.checked(checkbox)?);
    Ok(())
}

#[test]
fn label_click_toggles_its_checkbox_once() -> Result<()> {
    let mut doc = Document::from_html(
        "<label id='l' for='c'>Agree</label><input id='c' type='checkbox'>",
    )?;
    let log = record_events(&mut doc, &["click", "change"])?;
    let label = doc.select_one("#l")?;
    let checkbox = doc.select_one("#c")?;
    atoms::click(&mut doc, label, None)?;
    assert!(doc.checked(checkbox)?);
    assert_eq!(logged(&log), vec!["click #l", "click #c", "change #c"]);
    Ok(())
}

#[test]
fn clicking_an_option_selects_it() -> Result<()> {
    let mut doc = Document::from_html(
        "<select id='s'><option value='a'>A</option><option id='o' value='b'>B</option></select>",
    )?;
    let log = record_events(&mut doc, &["change"])?;
    let select = doc.select_one("#s")?;
    let option = doc.select_one("#o")?;
    atoms::click(&mut doc, option, None)?;
    assert_eq!(doc.value(select)?, "b");
    assert_eq!(doc.active_element(), select);
    assert_eq!(logged(&log), vec!["change #s"]);
    Ok(())
}

#[test]
fn open_alert_blocks_the_click() -> Result<()> {
    let mut doc = Document::from_html("<button id='b'>b</button>")?;
    let button = doc.select_one("#b")?;
    doc.add_event_listener(button, "click", false, |doc, _| {
        doc.open_alert("saved");
        Ok(())
    });
    let state = atoms::click(&mut doc, button, None)?;
    assert_eq!(doc.alert_text(), Some("saved"));
    assert!(matches!(
        atoms::click(&mut doc, button, Some(state.clone())),
        Err(Error::UnexpectedAlertOpen(_))
    ));
    assert_eq!(doc.dismiss_alert().as_deref(), Some("saved"));
    atoms::click(&mut doc, button, Some(state))?;
    Ok(())
}

#[test]
fn removed_element_is_stale() -> Result<()> {
    let mut doc = Document::from_html("<div><button id='b'>b</button></div>")?;
    let button = doc.select_one("#b")?;
    doc.remove_node(button)?;
    match atoms::click(&mut doc, button, None) {
        Err(Error::StaleElementReference(message)) => {
            assert_eq!(message, "Element is no longer attached to the DOM");
        }
        other => panic!("expected StaleElementReference, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn click_with_a_button_held_is_rejected_without_events() -> Result<()> {
    let mut doc = Document::from_html(
        r#"<div style='height: 1000px'></div>
           <div id='outer' style='overflow: auto; width: 200px; height: 100px'>
             <div style='height: 500px'></div>
             <button id='b'>b</button>
           </div>"#,
    )?;
    let log = record_events(&mut doc, MOUSE_EVENTS)?;
    let outer = doc.select_one("#outer")?;
    let button = doc.select_one("#b")?;
    assert_eq!(doc.clip_state(button)?, ClipState::Scroll);
    let held = MouseDeviceState {
        pressed_button: Some(MouseButton::Secondary),
        ..MouseDeviceState::default()
    };
    assert!(matches!(
        atoms::click(&mut doc, button, Some(held)),
        Err(Error::InvalidElementState(_))
    ));
    assert!(logged(&log).is_empty());
    assert_eq!(doc.window_scroll(), (0.0, 0.0));
    assert_eq!(doc.scroll_offset(outer)?, (0.0, 0.0));
    Ok(())
}

#[test]
fn listener_error_propagates_out_of_the_atom() -> Result<()> {
    let mut doc = Document::from_html("<button id='b'>b</button>")?;
    let button = doc.select_one("#b")?;
    doc.add_event_listener(button, "mousedown", false, |_, _| {
        Err(Error::JavascriptError("handler failed".into()))
    });
    assert_eq!(
        atoms::click(&mut doc, button, None),
        Err(Error::JavascriptError("handler failed".into()))
    );
    Ok(())
}
