use super::*;

/// Listener identity of a component callback.
///
/// A component creates its handlers once, keeps them as fields and passes the
/// same value to both registration and removal. Two handlers are the same
/// listener exactly when they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundHandler {
    host: NodeId,
    name: &'static str,
}

impl BoundHandler {
    pub fn new(host: NodeId, name: &'static str) -> Self {
        Self { host, name }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Id of a host-side observer registered with [`Document::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ListenerCallback {
    Element(BoundHandler),
    Observer(ListenerId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Listener {
    pub(crate) capture: bool,
    pub(crate) callback: ListenerCallback,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Listener>>>,
}

impl ListenerStore {
    /// Returns `false` when an identical listener is already registered.
    pub(crate) fn add(&mut self, node_id: NodeId, event: &str, listener: Listener) -> bool {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub(crate) fn remove(&mut self, node_id: NodeId, event: &str, listener: &Listener) -> bool {
        let Some(events) = self.map.get_mut(&node_id) else {
            return false;
        };
        let Some(listeners) = events.get_mut(event) else {
            return false;
        };

        let Some(pos) = listeners.iter().position(|l| l == listener) else {
            return false;
        };
        listeners.remove(pos);
        if listeners.is_empty() {
            events.remove(event);
        }
        if events.is_empty() {
            self.map.remove(&node_id);
        }
        true
    }

    pub(crate) fn remove_observer(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        for events in self.map.values_mut() {
            for listeners in events.values_mut() {
                let before = listeners.len();
                listeners.retain(|l| l.callback != ListenerCallback::Observer(id));
                removed |= listeners.len() != before;
            }
            events.retain(|_, listeners| !listeners.is_empty());
        }
        self.map.retain(|_, events| !events.is_empty());
        removed
    }

    pub(crate) fn contains(&self, node_id: NodeId, event: &str, listener: &Listener) -> bool {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .is_some_and(|listeners| listeners.contains(listener))
    }

    pub(crate) fn get(&self, node_id: NodeId, event: &str, capture: bool) -> Vec<Listener> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.capture == capture)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, node_id: NodeId, event: &str) -> usize {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// An event in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct EventState {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    pub detail: Option<serde_json::Value>,
    pub(crate) default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_propagation_stopped: bool,
}

impl EventState {
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            phase: EventPhase::None,
            bubbles: false,
            cancelable: false,
            detail: None,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub fn bubbling(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }
}

/// An event seen by a [`Document::listen`] observer.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedEvent {
    pub listener: ListenerId,
    pub event_type: String,
    pub target: NodeId,
    pub current_target: NodeId,
    pub phase: EventPhase,
    pub detail: Option<serde_json::Value>,
}

impl ObservedEvent {
    /// Decodes the event detail; `Ok(None)` when the event carried none.
    pub fn detail_as<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>> {
        self.detail
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| Error::EventDetail(err.to_string()))
    }
}

impl Document {
    pub(crate) fn dispatch_event(&mut self, mut event: EventState) -> Result<EventState> {
        let target = event.target;
        self.dom.ensure_valid(target)?;

        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            path.push(node);
            cursor = self.dom.parent(node);
        }
        path.reverse();

        self.trace_event_line(format!(
            "[event] dispatch {} target={} bubbles={}",
            event.event_type,
            self.node_label(target),
            event.bubbles
        ));

        let ancestors = &path[..path.len() - 1];

        for node in ancestors {
            event.phase = EventPhase::Capturing;
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true)?;
            if event.propagation_stopped {
                return Ok(self.finish_dispatch(event, "propagation_stopped"));
            }
        }

        // Target phase: capture listeners first, then bubble listeners.
        event.phase = EventPhase::AtTarget;
        event.current_target = target;
        self.invoke_listeners(target, &mut event, true)?;
        if event.propagation_stopped {
            return Ok(self.finish_dispatch(event, "propagation_stopped"));
        }
        self.invoke_listeners(target, &mut event, false)?;
        if event.propagation_stopped {
            return Ok(self.finish_dispatch(event, "propagation_stopped"));
        }

        if event.bubbles {
            for node in ancestors.iter().rev() {
                event.phase = EventPhase::Bubbling;
                event.current_target = *node;
                self.invoke_listeners(*node, &mut event, false)?;
                if event.propagation_stopped {
                    return Ok(self.finish_dispatch(event, "propagation_stopped"));
                }
            }
        }

        Ok(self.finish_dispatch(event, "completed"))
    }

    fn finish_dispatch(&mut self, mut event: EventState, outcome: &str) -> EventState {
        self.trace_event_line(format!(
            "[event] done {} target={} outcome={} default_prevented={}",
            event.event_type,
            self.node_label(event.target),
            outcome,
            event.default_prevented
        ));
        event.phase = EventPhase::None;
        event.current_target = event.target;
        event
    }

    fn invoke_listeners(
        &mut self,
        node_id: NodeId,
        event: &mut EventState,
        capture: bool,
    ) -> Result<()> {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            // Listeners removed by an earlier callback in this pass do not run.
            if !self
                .listeners
                .contains(node_id, &event.event_type, &listener)
            {
                continue;
            }

            match listener.callback {
                ListenerCallback::Element(handler) => {
                    let ran = self.run_element_callback(handler.host(), |element, ctx| {
                        element.handle_event(ctx, handler, event)
                    })?;
                    if !ran {
                        log::trace!(
                            "skipped {} listener {}: host busy or not upgraded",
                            event.event_type,
                            handler.name()
                        );
                    }
                }
                ListenerCallback::Observer(id) => {
                    self.observed_events.push(ObservedEvent {
                        listener: id,
                        event_type: event.event_type.clone(),
                        target: event.target,
                        current_target: event.current_target,
                        phase: event.phase,
                        detail: event.detail.clone(),
                    });
                }
            }

            if event.immediate_propagation_stopped {
                break;
            }
        }
        Ok(())
    }
}
