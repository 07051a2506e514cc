use std::cell::RefCell;
use std::rc::Rc;

use dom_atoms::keys::special;
use dom_atoms::{AtomConfig, Document, Error, Locator, Result, Strategy, atoms};

const LOGIN_HTML: &str = r#"
<style>
  .error { display: none; }
  .error.shown { display: block; }
</style>
<form id='login'>
  <label for='user'>User</label>
  <input id='user' name='user'>
  <label for='pass'>Password</label>
  <input id='pass' name='pass' type='password'>
  <label><input id='remember' type='checkbox'> Remember me</label>
  <button id='submit'>Sign in</button>
</form>
<p id='error' class='error'>Wrong password</p>
"#;

#[test]
fn login_form_is_filled_and_submitted() -> Result<()> {
    let mut doc = Document::from_html(LOGIN_HTML)?;
    let user = atoms::find_element(&mut doc, &Locator::id("user"), None)?;
    let pass = atoms::find_element(&mut doc, &Locator::new(Strategy::Name, "pass"), None)?;
    let remember = doc.select_one("#remember")?;
    let submit = atoms::find_element(&mut doc, &Locator::css("#submit"), None)?;

    let keyboard = atoms::send_keys(&mut doc, user, "taro", None, false)?;
    atoms::send_keys(&mut doc, pass, "s3cret", Some(keyboard), false)?;
    let mouse = atoms::click(&mut doc, remember, None)?;
    atoms::click(&mut doc, submit, Some(mouse))?;

    assert_eq!(doc.value(user)?, "taro");
    assert_eq!(doc.value(pass)?, "s3cret");
    assert!(doc.checked(remember)?);
    assert_eq!(doc.submissions().len(), 1);
    assert_eq!(doc.submissions()[0].submitter, Some(submit));
    Ok(())
}

#[test]
fn listener_can_reveal_an_element_between_atoms() -> Result<()> {
    let mut doc = Document::from_html(LOGIN_HTML)?;
    let form = doc.select_one("#login")?;
    let error = doc.select_one("#error")?;
    doc.add_event_listener(form, "submit", false, move |doc, event| {
        event.prevent_default();
        doc.set_attr(error, "class", "error shown")
    });

    assert!(!atoms::is_interactable(&doc, error)?);
    assert_eq!(atoms::get_visible_text(&doc, error)?, "");

    let submit = doc.select_one("#submit")?;
    atoms::click(&mut doc, submit, None)?;

    assert!(doc.submissions().is_empty());
    assert!(atoms::is_interactable(&doc, error)?);
    assert_eq!(atoms::get_visible_text(&doc, error)?, "Wrong password");
    Ok(())
}

#[test]
fn clicking_the_wrapping_label_checks_the_box() -> Result<()> {
    let mut doc = Document::from_html(LOGIN_HTML)?;
    let remember = doc.select_one("#remember")?;
    let label = doc.select_one("label:not([for])")?;
    atoms::click(&mut doc, label, None)?;
    assert!(doc.checked(remember)?);
    atoms::click(&mut doc, label, None)?;
    assert!(!doc.checked(remember)?);
    Ok(())
}

#[test]
fn radio_group_keeps_one_checked() -> Result<()> {
    let mut doc = Document::from_html(
        r#"<input type='radio' name='size' id='s' checked>
           <input type='radio' name='size' id='m'>
           <input type='radio' name='size' id='l'>"#,
    )?;
    let small = doc.select_one("#s")?;
    let large = doc.select_one("#l")?;
    atoms::click(&mut doc, large, None)?;
    assert!(doc.checked(large)?);
    assert!(!doc.checked(small)?);
    Ok(())
}

#[test]
fn summary_click_opens_details() -> Result<()> {
    let mut doc = Document::from_html(
        "<details id='d'><summary id='s'>More</summary><p>Body</p></details>",
    )?;
    let details = doc.select_one("#d")?;
    let summary = doc.select_one("#s")?;
    atoms::click(&mut doc, summary, None)?;
    assert_eq!(doc.attr(details, "open")?, Some(String::new()));
    Ok(())
}

#[test]
fn multiline_typing_into_a_textarea() -> Result<()> {
    let mut doc = Document::from_html("<textarea id='t'></textarea>")?;
    let textarea = doc.select_one("#t")?;
    let keys = format!("line one{}line two", special::ENTER);
    atoms::send_keys(&mut doc, textarea, &keys, None, false)?;
    assert_eq!(doc.value(textarea)?, "line one\nline two");
    Ok(())
}

#[test]
fn date_input_takes_the_whole_value_without_key_events() -> Result<()> {
    let mut doc = Document::from_html("<input id='d' type='date'>")?;
    let date = doc.select_one("#d")?;
    let keydowns = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&keydowns);
    doc.add_event_listener(date, "keydown", false, move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    atoms::send_keys(&mut doc, date, "2024-03-01", None, false)?;
    assert_eq!(doc.value(date)?, "2024-03-01");
    assert_eq!(*keydowns.borrow(), 0);
    Ok(())
}

#[test]
fn maxlength_stops_typing() -> Result<()> {
    let mut doc = Document::from_html("<input id='zip' maxlength='5'>")?;
    let zip = doc.select_one("#zip")?;
    atoms::send_keys(&mut doc, zip, "1234567", None, false)?;
    assert_eq!(doc.value(zip)?, "12345");
    Ok(())
}

#[test]
fn typing_into_contenteditable_updates_its_text() -> Result<()> {
    let mut doc = Document::from_html("<div id='e' contenteditable>Hi</div>")?;
    let editor = doc.select_one("#e")?;
    atoms::send_keys(&mut doc, editor, " there", None, false)?;
    assert_eq!(doc.text_content(editor)?, "Hi there");
    Ok(())
}

#[test]
fn link_text_search_uses_rendered_text() -> Result<()> {
    let mut doc = Document::from_html(
        r#"<a href='/a' style='text-transform: uppercase'>home</a>
           <a href='/b'>Docs <span style='display:none'>(beta)</span></a>"#,
    )?;
    let home = atoms::find_element(&mut doc, &Locator::link_text("HOME"), None)?;
    assert_eq!(doc.attr(home, "href")?.as_deref(), Some("/a"));
    let docs = atoms::find_element(&mut doc, &Locator::link_text("Docs"), None)?;
    assert_eq!(doc.attr(docs, "href")?.as_deref(), Some("/b"));
    assert!(matches!(
        atoms::find_element(&mut doc, &Locator::link_text("Docs (beta)"), None),
        Err(Error::NoSuchElement(_))
    ));
    Ok(())
}

#[test]
fn image_map_area_is_clickable() -> Result<()> {
    let mut doc = Document::from_html(
        r#"<img src='map.png' usemap='#nav' style='width: 200px; height: 100px; display: block'>
           <map name='nav'><area id='left' shape='rect' coords='0,0,100,100' href='#left'></map>"#,
    )?;
    let area = doc.select_one("#left")?;
    assert!(atoms::is_interactable(&doc, area)?);
    let clicks = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&clicks);
    doc.add_event_listener(area, "click", false, move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    atoms::click(&mut doc, area, None)?;
    assert_eq!(*clicks.borrow(), 1);
    Ok(())
}

#[test]
fn hidden_input_is_never_interactable() -> Result<()> {
    let mut doc = Document::from_html(
        "<form><input id='token' type='hidden' value='abc'></form>",
    )?;
    let token = doc.select_one("#token")?;
    assert!(!atoms::is_interactable(&doc, token)?);
    assert!(matches!(
        atoms::send_keys(&mut doc, token, "x", None, false),
        Err(Error::ElementNotInteractable(_))
    ));
    assert_eq!(doc.value(token)?, "abc");
    Ok(())
}

#[test]
fn small_viewport_needs_scrolling_before_a_click() -> Result<()> {
    let mut doc = Document::from_html_with_config(
        "<div style='height: 400px'></div><button id='b'>b</button>",
        AtomConfig::default().with_viewport(320.0, 240.0),
    )?;
    let button = doc.select_one("#b")?;
    assert!(!atoms::is_interactable(&doc, button)?);
    atoms::click(&mut doc, button, None)?;
    assert!(doc.window_scroll().1 > 0.0);
    assert!(atoms::is_interactable(&doc, button)?);
    Ok(())
}
