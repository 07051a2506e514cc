use super::*;

#[derive(Debug)]
struct TagPathEvaluator;

/// Understands `//tag` only.
impl XPathEvaluator for TagPathEvaluator {
    fn evaluate(&self, doc: &Document, expression: &str, context: NodeId) -> Result<Vec<NodeId>> {
        let tag = expression.strip_prefix("//").ok_or_else(|| {
            Error::InvalidSelector(format!("Unable to evaluate xpath: {expression}"))
        })?;
        let mut out = Vec::new();
        doc.dom.collect_elements_descendants_dfs(context, &mut out);
        Ok(out
            .into_iter()
            .filter(|node| doc.dom.has_tag(*node, tag))
            .collect())
    }
}

#[derive(Debug)]
struct DataTestResolver;

/// Resolves every locator value against `data-test`.
impl Resolver for DataTestResolver {
    fn resolve(&self, doc: &Document, locator: &Locator, root: NodeId) -> Result<Vec<NodeId>> {
        doc.dom
            .query_selector_all_from(root, &format!("[data-test='{}']", locator.value))
    }
}

#[test]
fn find_element_returns_the_first_match_in_document_order() -> Result<()> {
    let mut doc = Document::from_html(
        "<ul><li class='item'>a</li><li class='item' id='second'>b</li></ul>",
    )?;
    let found = atoms::find_element(&mut doc, &Locator::new(Strategy::ClassName, "item"), None)?;
    assert_eq!(doc.text_content(found)?, "a");
    let all = atoms::find_elements(&mut doc, &Locator::css("li.item"), None)?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[1], doc.select_one("#second")?);
    Ok(())
}

#[test]
fn missing_element_reports_the_locator() -> Result<()> {
    let mut doc = Document::from_html("<p>none</p>")?;
    match atoms::find_element(&mut doc, &Locator::id("ghost"), None) {
        Err(Error::NoSuchElement(message)) => {
            assert_eq!(message, "Unable to locate element: id=ghost");
        }
        other => panic!("expected NoSuchElement, got: {other:?}"),
    }
    assert!(atoms::find_elements(&mut doc, &Locator::id("ghost"), None)?.is_empty());
    Ok(())
}

#[test]
fn search_is_scoped_to_the_root() -> Result<()> {
    let mut doc = Document::from_html(
        "<div id='a'><span>1</span></div><div id='b'><span>2</span><span>3</span></div>",
    )?;
    let b = doc.select_one("#b")?;
    let spans = atoms::find_elements(&mut doc, &Locator::new(Strategy::TagName, "span"), Some(b))?;
    assert_eq!(spans.len(), 2);
    Ok(())
}

#[test]
fn invalid_css_is_an_invalid_selector() -> Result<()> {
    let mut doc = Document::from_html("<p>x</p>")?;
    assert!(matches!(
        atoms::find_element(&mut doc, &Locator::css("p[[["), None),
        Err(Error::InvalidSelector(_))
    ));
    Ok(())
}

#[test]
fn implicit_wait_advances_the_clock_and_times_out() -> Result<()> {
    let config = AtomConfig::default().with_implicit_wait_ms(250);
    let mut doc = Document::from_html_with_config("<p>x</p>", config)?;
    match atoms::find_element(&mut doc, &Locator::css("#late"), None) {
        Err(Error::Timeout(message)) => {
            assert_eq!(message, "Timed out after 250 ms waiting for element: css=#late");
        }
        other => panic!("expected Timeout, got: {other:?}"),
    }
    assert_eq!(doc.now_ms(), 250);

    let found = atoms::find_element(&mut doc, &Locator::css("p"), None)?;
    assert_eq!(doc.now_ms(), 250);
    assert_eq!(doc.tag_name(found)?, "p");
    Ok(())
}

#[test]
fn displayed_only_matches_skip_hidden_elements() -> Result<()> {
    let html = "<button style='display:none'>a</button><button id='shown'>b</button>";
    let mut doc = Document::from_html_with_config(
        html,
        AtomConfig::default().with_required_displayed_matches(true),
    )?;
    let found = atoms::find_element(&mut doc, &Locator::css("button"), None)?;
    assert_eq!(found, doc.select_one("#shown")?);

    let mut lenient = Document::from_html(html)?;
    assert_eq!(atoms::find_elements(&mut lenient, &Locator::css("button"), None)?.len(), 2);
    Ok(())
}

#[test]
fn installed_xpath_evaluator_serves_the_xpath_strategy() -> Result<()> {
    let mut doc = Document::from_html("<p>a</p><div><p>b</p></div>")?;
    assert!(matches!(
        atoms::find_elements(&mut doc, &Locator::xpath("//p"), None),
        Err(Error::UnsupportedOperation(_))
    ));
    doc.set_xpath_evaluator(Box::new(TagPathEvaluator));
    assert_eq!(atoms::find_elements(&mut doc, &Locator::xpath("//p"), None)?.len(), 2);
    Ok(())
}

#[test]
fn replacement_resolver_handles_every_strategy() -> Result<()> {
    let mut doc = Document::from_html("<button data-test='save'>Save</button>")?;
    doc.set_resolver(Box::new(DataTestResolver));
    let found = atoms::find_element(&mut doc, &Locator::link_text("save"), None)?;
    assert_eq!(doc.text_content(found)?, "Save");
    Ok(())
}

#[test]
fn frames_are_reachable_by_index_id_and_name() -> Result<()> {
    let mut doc = Document::from_html(
        r#"<iframe id='first' srcdoc='<p id="inner">one</p>'></iframe>
           <iframe name='second' srcdoc='<p id="inner">two</p>'></iframe>"#,
    )?;
    assert_eq!(doc.frame_count(), 2);

    let frame = doc.select_frame_by_index(1)?;
    let inner = frame.select_one("#inner")?;
    assert_eq!(frame.text_content(inner)?, "two");

    let frame = doc.select_frame_by_id_or_name("first")?;
    let inner = frame.select_one("#inner")?;
    assert_eq!(frame.text_content(inner)?, "one");

    assert!(doc.select_frame_by_id_or_name("second").is_ok());
    match doc.select_frame_by_index(5) {
        Err(Error::NoSuchFrame(message)) => assert_eq!(message, "Unable to locate frame: 5"),
        other => panic!("expected NoSuchFrame, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn frame_documents_run_atoms_independently() -> Result<()> {
    let mut doc = Document::from_html(r#"<iframe srcdoc='<input id="q">'></iframe>"#)?;
    let frame = doc.select_frame_by_index(0)?;
    let input = frame.select_one("#q")?;
    atoms::send_keys(frame, input, "inside", None, false)?;
    assert_eq!(frame.value(input)?, "inside");
    Ok(())
}

#[test]
fn element_references_are_stable_and_go_stale() -> Result<()> {
    let mut doc = Document::from_html("<div><span id='s'>x</span></div>")?;
    let span = doc.select_one("#s")?;
    let first = doc.element_reference(span)?;
    let again = doc.element_reference(span)?;
    assert_eq!(first, again);
    assert_eq!(first.id, ":wdc:1");
    assert_eq!(doc.resolve_reference(&first)?, span);

    doc.remove_node(span)?;
    assert_eq!(
        doc.resolve_reference(&first),
        Err(Error::StaleElementReference(
            "Element is no longer attached to the DOM".into()
        ))
    );
    assert_eq!(
        doc.resolve_reference(&ElementReference { id: ":wdc:7".into() }),
        Err(Error::StaleElementReference("Element does not exist in cache".into()))
    );
    Ok(())
}

#[test]
fn active_element_falls_back_to_body() -> Result<()> {
    let mut doc = Document::from_html("<input id='q'>")?;
    let body = doc.select_one("body")?;
    let input = doc.select_one("#q")?;
    assert_eq!(atoms::active_element(&doc), body);
    atoms::send_keys(&mut doc, input, "x", None, false)?;
    assert_eq!(atoms::active_element(&doc), input);
    Ok(())
}
