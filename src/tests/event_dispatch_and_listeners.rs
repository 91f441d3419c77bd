use super::*;
use std::cell::RefCell;
use std::rc::Rc;

struct StopHere {
    handler: BoundHandler,
    immediate: bool,
    registrations: Rc<RefCell<Vec<bool>>>,
}

impl CustomElement for StopHere {
    fn on_mount(&mut self, ctx: &mut ElementContext<'_>) -> Result<()> {
        let host = ctx.host();
        let first = ctx.add_listener(host, "click", self.handler)?;
        let second = ctx.add_listener(host, "click", self.handler)?;
        self.registrations.borrow_mut().extend([first, second]);
        Ok(())
    }

    fn handle_event(
        &mut self,
        _ctx: &mut ElementContext<'_>,
        handler: BoundHandler,
        event: &mut EventState,
    ) -> Result<()> {
        assert_eq!(handler, self.handler);
        if self.immediate {
            event.stop_immediate_propagation();
        } else {
            event.stop_propagation();
        }
        Ok(())
    }
}

fn define_stopper(doc: &mut Document, immediate: bool) -> Result<Rc<RefCell<Vec<bool>>>> {
    let registrations = Rc::new(RefCell::new(Vec::new()));
    let shared = Rc::clone(&registrations);
    doc.define("x-stop", &[], move |ctx| {
        Ok(Box::new(StopHere {
            handler: BoundHandler::new(ctx.host(), "stop"),
            immediate,
            registrations: Rc::clone(&shared),
        }) as Box<dyn CustomElement>)
    })?;
    Ok(registrations)
}

const NESTED: &str = r#"<div id="outer"><x-stop id="inner"><span id="leaf">x</span></x-stop></div>"#;

#[test]
fn bubbling_event_reaches_target_then_ancestors() -> Result<()> {
    let mut doc = Document::from_html(r#"<div id="outer"><p id="inner">x</p></div>"#)?;
    let outer = doc.listen("#outer", "ping")?;
    let inner = doc.listen("#inner", "ping")?;
    let target = doc.select("#inner")?;

    doc.dispatch_to(EventState::new("ping", target).bubbling(true))?;
    let seen = doc.take_observed_events();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].listener, inner);
    assert_eq!(seen[0].phase, EventPhase::AtTarget);
    assert_eq!(seen[1].listener, outer);
    assert_eq!(seen[1].phase, EventPhase::Bubbling);
    assert_eq!(seen[1].target, target);
    assert_eq!(seen[1].current_target, doc.select("#outer")?);
    Ok(())
}

#[test]
fn non_bubbling_event_stays_on_target() -> Result<()> {
    let mut doc = Document::from_html(r#"<div id="outer"><p id="inner">x</p></div>"#)?;
    doc.listen("#outer", "ping")?;
    let inner = doc.listen("#inner", "ping")?;

    let finished = doc.dispatch("#inner", "ping")?;
    assert_eq!(finished.phase, EventPhase::None);
    let seen = doc.take_observed_events();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].listener, inner);
    Ok(())
}

#[test]
fn unlisten_removes_only_that_observer() -> Result<()> {
    let mut doc = Document::from_html(r#"<p id="p">x</p>"#)?;
    let first = doc.listen("#p", "ping")?;
    let second = doc.listen("#p", "ping")?;
    let node = doc.select("#p")?;
    assert_eq!(doc.listener_count(node, "ping"), 2);

    assert!(doc.unlisten(first));
    assert!(!doc.unlisten(first));
    doc.dispatch("#p", "ping")?;

    let seen = doc.take_observed_events();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].listener, second);
    Ok(())
}

#[test]
fn identical_component_listener_is_registered_once() -> Result<()> {
    let mut doc = Document::from_html(NESTED)?;
    let registrations = define_stopper(&mut doc, false)?;
    assert_eq!(*registrations.borrow(), vec![true, false]);
    let inner = doc.select("#inner")?;
    assert_eq!(doc.listener_count(inner, "click"), 1);
    Ok(())
}

#[test]
fn stop_propagation_finishes_current_node_but_skips_ancestors() -> Result<()> {
    let mut doc = Document::from_html(NESTED)?;
    define_stopper(&mut doc, false)?;
    doc.listen("#outer", "click")?;
    let inner = doc.listen("#inner", "click")?;

    doc.click("#leaf")?;
    let seen = doc.take_observed_events();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].listener, inner);
    assert_eq!(seen[0].phase, EventPhase::Bubbling);
    Ok(())
}

#[test]
fn stop_immediate_propagation_skips_remaining_listeners_on_node() -> Result<()> {
    let mut doc = Document::from_html(NESTED)?;
    define_stopper(&mut doc, true)?;
    doc.listen("#outer", "click")?;
    doc.listen("#inner", "click")?;

    doc.click("#leaf")?;
    assert!(doc.take_observed_events().is_empty());
    Ok(())
}

#[test]
fn prevent_default_requires_cancelable_event() -> Result<()> {
    let doc = Document::from_html("<p>x</p>")?;
    let node = doc.select("p")?;

    let mut plain = EventState::new("ping", node);
    plain.prevent_default();
    assert!(!plain.default_prevented());

    let mut cancelable = EventState::new("ping", node).cancelable(true);
    cancelable.prevent_default();
    assert!(cancelable.default_prevented());
    Ok(())
}

#[test]
fn dispatch_to_unknown_node_fails() -> Result<()> {
    let mut doc = Document::from_html("<p>x</p>")?;
    match doc.dispatch_to(EventState::new("ping", NodeId(999))) {
        Err(Error::InvalidNode(_)) => Ok(()),
        other => panic!("expected InvalidNode, got: {other:?}"),
    }
}

#[test]
fn observed_detail_decodes_into_typed_payload() -> Result<()> {
    let mut doc = Document::from_html(r#"<p id="p">x</p>"#)?;
    let node = doc.select("#p")?;
    doc.listen("#p", "ping")?;

    doc.dispatch_to(EventState::new("ping", node).with_detail(serde_json::json!({ "value": 3 })))?;
    doc.dispatch_to(EventState::new("ping", node).with_detail(serde_json::json!("three")))?;
    doc.dispatch_to(EventState::new("ping", node))?;

    let seen = doc.take_observed_events();
    assert_eq!(
        seen[0].detail_as::<QuantityChange>()?,
        Some(QuantityChange { value: 3 })
    );
    assert!(matches!(
        seen[1].detail_as::<QuantityChange>(),
        Err(Error::EventDetail(_))
    ));
    assert_eq!(seen[2].detail_as::<QuantityChange>()?, None);
    Ok(())
}

#[test]
fn listener_store_add_and_remove_are_symmetric() {
    let mut store = ListenerStore::default();
    let node = NodeId(1);
    let listener = Listener {
        capture: false,
        callback: ListenerCallback::Element(BoundHandler::new(NodeId(0), "run")),
    };
    let capture = Listener {
        capture: true,
        ..listener.clone()
    };

    assert!(store.add(node, "click", listener.clone()));
    assert!(!store.add(node, "click", listener.clone()));
    assert!(store.add(node, "click", capture.clone()));
    assert_eq!(store.count(node, "click"), 2);
    assert_eq!(store.get(node, "click", true), vec![capture.clone()]);

    assert!(store.remove(node, "click", &listener));
    assert!(!store.remove(node, "click", &listener));
    assert!(store.remove(node, "click", &capture));
    assert_eq!(store.count(node, "click"), 0);
}
