use super::*;

/// A live document: the node tree, its listeners and the components mounted
/// on its custom elements.
///
/// Every public mutation runs the custom element reactions it causes before
/// returning, so the document is always observed in a settled state.
pub struct Document {
    pub(crate) dom: Dom,
    pub(crate) listeners: ListenerStore,
    pub(crate) registry: CustomElementRegistry,
    pub(crate) instances: HashMap<NodeId, Box<dyn CustomElement>>,
    pub(crate) busy: HashSet<NodeId>,
    pub(crate) reactions: VecDeque<Reaction>,
    pub(crate) flushing: bool,
    pub(crate) styles: StyleState,
    pub(crate) quantity_configs: HashMap<String, std::rc::Rc<QuantityModifierConfig>>,
    pub(crate) observed_events: Vec<ObservedEvent>,
    pub(crate) next_listener_id: u64,
    pub(crate) trace: TraceState,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.dom.nodes.len())
            .field("registry", &self.registry)
            .field("upgraded", &self.instances.len())
            .field("pending_reactions", &self.reactions.len())
            .finish()
    }
}

/// Trace buffer settings of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSettings {
    pub enabled: bool,
    pub events: bool,
    pub log_limit: usize,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            log_limit: 10_000,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct TraceState {
    pub(crate) settings: TraceSettings,
    pub(crate) logs: VecDeque<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            dom: Dom::new(),
            listeners: ListenerStore::default(),
            registry: CustomElementRegistry::default(),
            instances: HashMap::new(),
            busy: HashSet::new(),
            reactions: VecDeque::new(),
            flushing: false,
            styles: StyleState::default(),
            quantity_configs: HashMap::new(),
            observed_events: Vec::new(),
            next_listener_id: 1,
            trace: TraceState::default(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            ..Self::default()
        })
    }

    pub fn root(&self) -> NodeId {
        self.dom.root
    }

    pub fn select(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    /// First descendant of `scope` matching `selector`.
    pub fn select_within(&self, scope: NodeId, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector_from(scope, selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.dom.query_selector_all(selector)?.len())
    }

    pub fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let target = self.select(selector)?;
        Ok(self.dom.attr(target, name))
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select(selector)?;
        self.dom.value(target)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select(selector)?;
        Ok(self.dom.text_content(target))
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.dom.is_connected(node)
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select(selector)?;
        self.click_node(target)
    }

    pub fn click_node(&mut self, target: NodeId) -> Result<()> {
        let event = EventState::new("click", target)
            .bubbling(true)
            .cancelable(true);
        self.dispatch_event(event)?;
        self.flush_reactions()
    }

    /// Replaces the live value of an input or textarea and fires `input`.
    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select(selector)?;
        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_string();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(EventState::new("input", target).bubbling(true))?;
        self.flush_reactions()
    }

    /// Fires a plain, non-bubbling event at the first match of `selector`.
    pub fn dispatch(&mut self, selector: &str, event_type: &str) -> Result<EventState> {
        let target = self.select(selector)?;
        let event = self.dispatch_event(EventState::new(event_type, target))?;
        self.flush_reactions()?;
        Ok(event)
    }

    pub fn dispatch_to(&mut self, event: EventState) -> Result<EventState> {
        let event = self.dispatch_event(event)?;
        self.flush_reactions()?;
        Ok(event)
    }

    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) -> Result<()> {
        let target = self.select(selector)?;
        self.write_attribute(target, name, value)
    }

    pub fn remove_attribute(&mut self, selector: &str, name: &str) -> Result<()> {
        let target = self.select(selector)?;
        let old = self.dom.remove_attr(target, name)?;
        if old.is_some() {
            self.queue_attribute_reaction(target, name, old, None);
        }
        self.flush_reactions()
    }

    pub(crate) fn write_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let old = self.dom.set_attr(node, name, value)?;
        self.queue_attribute_reaction(node, name, old, Some(value.to_string()));
        self.flush_reactions()
    }

    /// Removes the first match of `selector` from the tree. The returned node
    /// can be put back with [`Document::append`].
    pub fn detach(&mut self, selector: &str) -> Result<NodeId> {
        let target = self.select(selector)?;
        self.detach_node(target)?;
        Ok(target)
    }

    pub fn detach_node(&mut self, node: NodeId) -> Result<()> {
        let unmounts = self.unmount_reactions(node);
        self.dom.detach(node)?;
        self.reactions.extend(unmounts);
        self.trace_line(format!("[tree] detached {}", self.node_label(node)));
        self.flush_reactions()
    }

    /// Appends `node` (typically one returned by [`Document::detach`]) to the
    /// first match of `parent_selector`.
    pub fn append(&mut self, parent_selector: &str, node: NodeId) -> Result<()> {
        let parent = self.select(parent_selector)?;
        self.append_node(parent, node)
    }

    pub fn append_node(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        self.dom.ensure_valid(node)?;
        let unmounts = self.unmount_reactions(node);
        self.dom.append_child(parent, node)?;
        self.reactions.extend(unmounts);
        self.trace_line(format!(
            "[tree] appended {} to {}",
            self.node_label(node),
            self.node_label(parent)
        ));
        self.connect_subtree(node)?;
        self.flush_reactions()
    }

    /// Parses `html` and appends the resulting nodes to the first match of
    /// `parent_selector`, upgrading any defined custom elements among them.
    pub fn insert_html(&mut self, parent_selector: &str, html: &str) -> Result<Vec<NodeId>> {
        let parent = self.select(parent_selector)?;
        if !self.dom.can_have_children(parent) {
            return Err(Error::HierarchyRequest(format!(
                "{parent_selector} cannot have children"
            )));
        }
        let fragment = parse_html(html)?;
        let inserted = self.dom.adopt_fragment(parent, &fragment)?;
        for node in &inserted {
            self.connect_subtree(*node)?;
        }
        self.flush_reactions()?;
        Ok(inserted)
    }

    pub(crate) fn replace_children_with_html(&mut self, node: NodeId, html: &str) -> Result<()> {
        let unmounts = self
            .dom
            .children(node)
            .to_vec()
            .into_iter()
            .flat_map(|child| self.unmount_reactions(child))
            .collect::<Vec<_>>();
        let inserted = self.dom.set_inner_html(node, html)?;
        self.reactions.extend(unmounts);
        for child in inserted {
            self.connect_subtree(child)?;
        }
        self.flush_reactions()
    }

    /// Registers an observer that records every `event_type` event reaching
    /// the first match of `selector` in the bubble or target phase.
    pub fn listen(&mut self, selector: &str, event_type: &str) -> Result<ListenerId> {
        let target = self.select(selector)?;
        Ok(self.listen_node(target, event_type))
    }

    pub fn listen_node(&mut self, node: NodeId, event_type: &str) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.add(
            node,
            event_type,
            Listener {
                capture: false,
                callback: ListenerCallback::Observer(id),
            },
        );
        id
    }

    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove_observer(id)
    }

    pub fn take_observed_events(&mut self) -> Vec<ObservedEvent> {
        std::mem::take(&mut self.observed_events)
    }

    /// Number of listeners of any kind registered for `event_type` on `node`.
    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(node, event_type)
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select(selector)?;
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select(selector)?;
        let actual = self.dom.text_content(target);
        self.check(selector, target, expected, actual)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select(selector)?;
        let actual = self.dom.value(target)?;
        self.check(selector, target, expected, actual)
    }

    pub fn assert_attribute(&self, selector: &str, name: &str, expected: &str) -> Result<()> {
        let target = self.select(selector)?;
        let actual = self
            .dom
            .attr(target, name)
            .unwrap_or_else(|| "<missing>".to_string());
        self.check(selector, target, expected, actual)
    }

    fn check(&self, selector: &str, target: NodeId, expected: &str, actual: String) -> Result<()> {
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn dump_document(&self) -> String {
        self.dom.dump_node(self.dom.root)
    }

    pub(crate) fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    pub(crate) fn node_label(&self, node_id: NodeId) -> String {
        match self.dom.tag_name(node_id) {
            Some(tag) => match self.dom.attr(node_id, "id") {
                Some(id) if !id.is_empty() => format!("{tag}#{id}"),
                _ => format!("{tag}@{}", node_id.0),
            },
            None if node_id == self.dom.root => "#document".to_string(),
            None => format!("#node@{}", node_id.0),
        }
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.settings.enabled = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.settings.events = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Config(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.settings.log_limit = max_entries;
        while self.trace.logs.len() > max_entries {
            self.trace.logs.pop_front();
        }
        Ok(())
    }

    pub fn trace_settings(&self) -> TraceSettings {
        self.trace.settings
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.logs.drain(..).collect()
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace.settings.events {
            self.trace_line(line);
        }
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace.settings.enabled {
            return;
        }
        log::trace!("{line}");
        if self.trace.logs.len() >= self.trace.settings.log_limit {
            self.trace.logs.pop_front();
        }
        self.trace.logs.push_back(line);
    }
}
