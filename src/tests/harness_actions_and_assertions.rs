use super::*;

#[test]
fn type_text_writes_live_value_and_fires_bubbling_input() -> Result<()> {
    let mut doc = Document::from_html(r#"<form id="f"><input id="q" value="1"><textarea id="t"></textarea></form>"#)?;
    let form_listener = doc.listen("#f", "input")?;

    doc.type_text("#q", "42")?;
    doc.type_text("#t", "notes")?;
    doc.assert_value("#q", "42")?;
    doc.assert_value("#t", "notes")?;
    doc.assert_attribute("#q", "value", "1")?;

    let seen = doc.take_observed_events();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|event| event.listener == form_listener));
    assert_eq!(seen[0].target, doc.select("#q")?);
    Ok(())
}

#[test]
fn type_text_rejects_non_text_controls() -> Result<()> {
    let mut doc = Document::from_html(r#"<div id="d"></div>"#)?;
    match doc.type_text("#d", "x") {
        Err(Error::TypeMismatch {
            selector,
            expected,
            actual,
        }) => {
            assert_eq!(selector, "#d");
            assert_eq!(expected, "input or textarea");
            assert_eq!(actual, "div");
        }
        other => panic!("expected type mismatch, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn click_is_bubbling_and_cancelable() -> Result<()> {
    let mut doc = Document::from_html(r#"<div id="outer"><button id="b">go</button></div>"#)?;
    doc.listen("#outer", "click")?;
    doc.click("#b")?;

    let seen = doc.take_observed_events();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].phase, EventPhase::Bubbling);
    assert_eq!(seen[0].target, doc.select("#b")?);
    Ok(())
}

#[test]
fn failed_assertions_report_expected_actual_and_snippet() -> Result<()> {
    let doc = Document::from_html(r#"<p id="p" class="note">hello</p>"#)?;
    match doc.assert_text("#p", "bye") {
        Err(Error::AssertionFailed {
            selector,
            expected,
            actual,
            dom_snippet,
        }) => {
            assert_eq!(selector, "#p");
            assert_eq!(expected, "bye");
            assert_eq!(actual, "hello");
            assert_eq!(dom_snippet, r#"<p class="note" id="p">hello</p>"#);
        }
        other => panic!("expected assertion failure, got: {other:?}"),
    }

    match doc.assert_attribute("#p", "title", "x") {
        Err(Error::AssertionFailed { actual, .. }) => assert_eq!(actual, "<missing>"),
        other => panic!("expected assertion failure, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn long_snippets_are_truncated() -> Result<()> {
    let body = "x".repeat(300);
    let doc = Document::from_html(&format!(r#"<p id="p">{body}</p>"#))?;
    match doc.assert_text("#p", "") {
        Err(Error::AssertionFailed { dom_snippet, .. }) => {
            assert!(dom_snippet.ends_with("..."));
            assert_eq!(dom_snippet.chars().count(), 203);
        }
        other => panic!("expected assertion failure, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn insert_html_appends_after_existing_children() -> Result<()> {
    let mut doc = Document::from_html(r#"<ul id="list"><li>a</li></ul>"#)?;
    let inserted = doc.insert_html("#list", "<li>b</li>text")?;
    assert_eq!(inserted.len(), 2);
    assert_eq!(doc.dump_dom("#list")?, r#"<ul id="list"><li>a</li><li>b</li>text</ul>"#);
    Ok(())
}

#[test]
fn detached_node_can_be_reappended_elsewhere() -> Result<()> {
    let mut doc = Document::from_html(r#"<div id="a"><p id="p">x</p></div><div id="b"></div>"#)?;
    let node = doc.detach("#p")?;
    assert_eq!(doc.count("#p")?, 0);

    doc.append("#b", node)?;
    assert_eq!(doc.count("#b > #p")?, 1);
    assert_eq!(doc.dump_dom("#a")?, r#"<div id="a"></div>"#);

    match doc.append("#p", doc.select("#b")?) {
        Err(Error::HierarchyRequest(_)) => {}
        other => panic!("expected cycle to be rejected, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn dump_document_serializes_all_top_level_nodes() -> Result<()> {
    let doc = Document::from_html("<p>a</p><p>b</p>")?;
    assert_eq!(doc.dump_document(), "<p>a</p><p>b</p>");
    Ok(())
}

#[test]
fn error_messages_name_the_failing_input() {
    assert_eq!(
        Error::SelectorNotFound("#x".into()).to_string(),
        "selector not found: #x"
    );
    assert_eq!(
        Error::InvalidCustomElementName("stepper".into()).to_string(),
        "invalid custom element name: stepper"
    );
}
