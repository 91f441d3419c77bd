use super::*;

#[test]
fn nested_markup_builds_tree_with_decoded_text() -> Result<()> {
    let doc = Document::from_html(
        r#"<div id='a' class='x y'><span>hi &amp; bye</span><input value=3></div>"#,
    )?;
    doc.assert_text("#a", "hi & bye")?;
    doc.assert_value("input", "3")?;
    assert_eq!(doc.attribute("#a", "class")?, Some("x y".to_string()));
    assert_eq!(doc.count("div > span")?, 1);
    Ok(())
}

#[test]
fn tag_and_attribute_names_are_lowercased() -> Result<()> {
    let doc = Document::from_html("<DIV ID=box DATA-Kind='a'></DIV>")?;
    doc.assert_exists("div#box")?;
    doc.assert_attribute("#box", "data-kind", "a")?;
    Ok(())
}

#[test]
fn bare_attribute_is_empty_and_first_duplicate_wins() -> Result<()> {
    let doc = Document::from_html(r#"<button id="b" disabled title="one" title="two"></button>"#)?;
    assert_eq!(doc.attribute("#b", "disabled")?, Some(String::new()));
    doc.assert_attribute("#b", "title", "one")?;
    Ok(())
}

#[test]
fn void_elements_do_not_swallow_following_siblings() -> Result<()> {
    let doc = Document::from_html("<div id=r><input><br><p>after</p></div>")?;
    assert_eq!(doc.count("div > p")?, 1);
    assert_eq!(doc.count("input p")?, 0);
    assert_eq!(doc.dump_dom("#r")?, r#"<div id="r"><input><br><p>after</p></div>"#);
    Ok(())
}

#[test]
fn raw_text_elements_keep_markup_like_content() -> Result<()> {
    let doc = Document::from_html("<style>a < b { color: red }</style><p id=p>ok</p>")?;
    doc.assert_text("style", "a < b { color: red }")?;
    doc.assert_text("#p", "ok")?;
    Ok(())
}

#[test]
fn comments_declarations_and_stray_end_tags_are_skipped() -> Result<()> {
    let doc = Document::from_html(
        "<!DOCTYPE html><!-- note --><div id='a'></span>ok<!-- <b>x</b> --></div>",
    )?;
    doc.assert_text("#a", "ok")?;
    assert_eq!(doc.count("b")?, 0);
    Ok(())
}

#[test]
fn less_than_sign_not_opening_a_tag_is_text() -> Result<()> {
    let doc = Document::from_html("<p id=p>1 < 2 &#65;&#x42; &bogus;</p>")?;
    doc.assert_text("#p", "1 < 2 AB &bogus;")?;
    Ok(())
}

#[test]
fn unterminated_constructs_are_parse_errors() {
    for html in ["<!-- open", "<div id='x", "<style>body {}", "<p></p"] {
        match Document::from_html(html) {
            Err(Error::HtmlParse(_)) => {}
            other => panic!("expected parse error for {html:?}, got: {other:?}"),
        }
    }
}

#[test]
fn dump_escapes_text_and_attribute_values() -> Result<()> {
    let doc = Document::from_html(r#"<p title='a"b' id=p>x &lt; y &amp; z</p>"#)?;
    assert_eq!(
        doc.dump_dom("#p")?,
        r#"<p id="p" title="a&quot;b">x &lt; y &amp; z</p>"#
    );
    Ok(())
}

#[test]
fn append_child_rejects_cycles_and_text_parents() -> Result<()> {
    let mut dom = parse_html("<div id=outer><div id=inner>t</div></div>")?;
    let outer = dom.query_selector("#outer")?.expect("outer exists");
    let inner = dom.query_selector("#inner")?.expect("inner exists");
    let text = dom.children(inner)[0];

    assert!(matches!(
        dom.append_child(inner, outer),
        Err(Error::HierarchyRequest(_))
    ));
    assert!(matches!(
        dom.append_child(text, outer),
        Err(Error::HierarchyRequest(_))
    ));
    assert!(matches!(
        dom.append_child(outer, outer),
        Err(Error::HierarchyRequest(_))
    ));
    Ok(())
}

#[test]
fn detached_nodes_keep_their_ids_and_subtree() -> Result<()> {
    let mut dom = parse_html("<section><div id=a><b>x</b></div></section>")?;
    let a = dom.query_selector("#a")?.expect("a exists");
    dom.detach(a)?;

    assert!(!dom.is_connected(a));
    assert_eq!(dom.query_selector("#a")?, None);
    assert_eq!(dom.text_content(a), "x");

    let section = dom.query_selector("section")?.expect("section exists");
    dom.append_child(section, a)?;
    assert!(dom.is_connected(a));
    assert_eq!(dom.query_selector("section > #a")?, Some(a));
    Ok(())
}

#[test]
fn live_value_shadows_value_attribute() -> Result<()> {
    let mut dom = parse_html("<input id=f value=1>")?;
    let field = dom.query_selector("#f")?.expect("field exists");
    assert_eq!(dom.value(field)?, "1");

    dom.set_value(field, "7")?;
    assert_eq!(dom.value(field)?, "7");
    assert_eq!(dom.attr(field, "value"), Some("1".to_string()));
    Ok(())
}
