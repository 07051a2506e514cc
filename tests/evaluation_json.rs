use dom_atoms::evaluation::{execute, execute_json};
use dom_atoms::{AtomRequest, Document, ElementReference, Error, Evaluation, Result};
use serde_json::json;

fn to_json_error(err: serde_json::Error) -> Error {
    Error::JavascriptError(err.to_string())
}

fn reference_of(evaluation: Evaluation) -> Result<ElementReference> {
    serde_json::from_value(evaluation.into_result()?).map_err(to_json_error)
}

#[test]
fn find_then_type_then_read_back_through_json() -> Result<()> {
    let mut doc = Document::from_html(
        "<label>Search <input id='q' name='q'></label><p id='echo'>typed: <b>none</b></p>",
    )?;
    let input = reference_of(execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"css selector": "input[name=q]"}}"#,
    ))?;

    let request = json!({
        "atom": "sendKeys",
        "element": input,
        "keys": "dom atoms",
    });
    let typed = execute_json(&mut doc, &request.to_string());
    assert_eq!(typed.status, 0, "{typed:?}");
    assert_eq!(typed.value["caret"], json!(9));
    assert_eq!(typed.value["heldKeys"], json!([]));

    let echo = reference_of(execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"id": "echo"}}"#,
    ))?;
    let text = execute(&mut doc, AtomRequest::GetVisibleText { element: echo });
    assert_eq!(text.into_result()?, json!("typed: none"));

    let node = doc.resolve_reference(&input)?;
    assert_eq!(doc.value(node)?, "dom atoms");
    Ok(())
}

#[test]
fn keyboard_state_travels_between_requests() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let input = reference_of(execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"id": "q"}}"#,
    ))?;

    let hold_shift = json!({
        "atom": "sendKeys",
        "element": input,
        "keys": "\u{E008}",
        "persistModifiers": true,
    });
    let held = execute_json(&mut doc, &hold_shift.to_string()).into_result()?;
    assert_eq!(held["heldKeys"], json!(["shift"]));

    let type_with_shift = json!({
        "atom": "sendKeys",
        "element": input,
        "keys": "ok",
        "state": held,
    });
    execute_json(&mut doc, &type_with_shift.to_string()).into_result()?;
    let node = doc.resolve_reference(&input)?;
    assert_eq!(doc.value(node)?, "OK");
    Ok(())
}

#[test]
fn find_elements_answers_with_a_reference_list() -> Result<()> {
    let mut doc = Document::from_html("<ul><li>a</li><li>b</li><li>c</li></ul>")?;
    let found = execute_json(
        &mut doc,
        r#"{"atom": "findElements", "locator": {"tagName": "li"}}"#,
    )
    .into_result()?;
    let references: Vec<ElementReference> =
        serde_json::from_value(found).map_err(to_json_error)?;
    assert_eq!(
        references
            .iter()
            .map(|reference| reference.id.as_str())
            .collect::<Vec<_>>(),
        vec![":wdc:1", ":wdc:2", ":wdc:3"]
    );
    Ok(())
}

#[test]
fn interactability_and_active_element() -> Result<()> {
    let mut doc = Document::from_html("<button id='b'>b</button><button id='h' hidden>h</button>")?;
    let shown = reference_of(execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"id": "b"}}"#,
    ))?;
    let hidden = reference_of(execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"id": "h"}}"#,
    ))?;
    let is_shown = execute(&mut doc, AtomRequest::IsInteractable { element: shown.clone() });
    let is_hidden = execute(&mut doc, AtomRequest::IsInteractable { element: hidden });
    assert_eq!(is_shown.into_result()?, json!(true));
    assert_eq!(is_hidden.into_result()?, json!(false));

    execute(&mut doc, AtomRequest::Click { element: shown.clone(), state: None }).into_result()?;
    let active = reference_of(execute(&mut doc, AtomRequest::ActiveElement))?;
    assert_eq!(active, shown);
    Ok(())
}

#[test]
fn error_envelopes_decode_back_to_errors() -> Result<()> {
    let mut doc = Document::from_html("<p id='p'>text</p>")?;
    let p = reference_of(execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"id": "p"}}"#,
    ))?;
    let cleared = execute(&mut doc, AtomRequest::Clear { element: p });
    assert_eq!(cleared.status, 12);
    assert_eq!(
        cleared.into_result(),
        Err(Error::InvalidElementState(
            "Element must be user-editable in order to clear it.".into()
        ))
    );

    let bad_locator = execute_json(
        &mut doc,
        r#"{"atom": "findElement", "locator": {"className": "a b"}}"#,
    );
    assert_eq!(bad_locator.status, 32);

    let json = serde_json::to_value(Evaluation::failure(&Error::Timeout("slow".into())))
        .map_err(to_json_error)?;
    assert_eq!(json, json!({"status": 21, "value": {"message": "slow"}}));
    Ok(())
}
