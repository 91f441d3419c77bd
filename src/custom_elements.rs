use super::*;
use std::rc::Rc;

/// A component that can be mounted on an element of a [`Document`].
///
/// Every hook receives an [`ElementContext`] bound to the host element. All
/// hooks default to doing nothing.
pub trait CustomElement {
    /// The host became connected to the document.
    fn on_mount(&mut self, ctx: &mut ElementContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// The host was disconnected from the document.
    fn on_unmount(&mut self, ctx: &mut ElementContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// An observed attribute of the host was written or removed. Also called
    /// once per present observed attribute (with `old == None`) right after
    /// construction.
    fn on_attribute_change(
        &mut self,
        ctx: &mut ElementContext<'_>,
        name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<()> {
        let _ = (ctx, name, old, new);
        Ok(())
    }

    /// A listener registered with `handler` fired.
    fn handle_event(
        &mut self,
        ctx: &mut ElementContext<'_>,
        handler: BoundHandler,
        event: &mut EventState,
    ) -> Result<()> {
        let _ = (ctx, handler, event);
        Ok(())
    }
}

type Constructor = Rc<dyn Fn(&mut ElementContext<'_>) -> Result<Box<dyn CustomElement>>>;

#[derive(Clone)]
pub(crate) struct ElementDefinition {
    pub(crate) observed_attributes: Vec<String>,
    pub(crate) constructor: Constructor,
}

#[derive(Clone, Default)]
pub(crate) struct CustomElementRegistry {
    definitions: HashMap<String, ElementDefinition>,
}

impl std::fmt::Debug for CustomElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.definitions.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("CustomElementRegistry")
            .field("definitions", &names)
            .finish()
    }
}

impl CustomElementRegistry {
    pub(crate) fn get(&self, name: &str) -> Option<&ElementDefinition> {
        self.definitions.get(name)
    }

    pub(crate) fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    fn insert(&mut self, name: &str, definition: ElementDefinition) -> Result<()> {
        if !is_valid_custom_element_name(name) {
            return Err(Error::InvalidCustomElementName(name.to_string()));
        }
        if self.definitions.contains_key(name) {
            return Err(Error::DuplicateDefinition(name.to_string()));
        }
        self.definitions.insert(name.to_string(), definition);
        Ok(())
    }
}

pub(crate) fn is_valid_custom_element_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.first().is_some_and(u8::is_ascii_lowercase)
        && name.contains('-')
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'-' | b'.' | b'_'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReactionKind {
    Mount,
    Unmount,
    AttributeChanged {
        name: String,
        old: Option<String>,
        new: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reaction {
    pub(crate) host: NodeId,
    pub(crate) kind: ReactionKind,
}

/// What a [`CustomElement`] sees of its document while one of its hooks runs.
pub struct ElementContext<'a> {
    document: &'a mut Document,
    host: NodeId,
}

impl<'a> ElementContext<'a> {
    pub(crate) fn new(document: &'a mut Document, host: NodeId) -> Self {
        Self { document, host }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.document.dom.attr(self.host, name)
    }

    /// Writes an attribute of the host. Observation of the write is delivered
    /// to this element after the running hook returns.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.document.write_attribute(self.host, name, value)
    }

    /// First descendant of the host matching `selector`.
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>> {
        self.document.dom.query_selector_from(self.host, selector)
    }

    /// Replaces the host's children with parsed markup.
    pub fn set_inner_html(&mut self, html: &str) -> Result<()> {
        self.document.replace_children_with_html(self.host, html)
    }

    pub fn node_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.document.dom.attr(node, name)
    }

    pub fn set_node_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.ensure_in_subtree(node)?;
        self.document.write_attribute(node, name, value)
    }

    /// Live value of a form control in the host's subtree.
    pub fn node_value(&self, node: NodeId) -> Result<String> {
        self.document.dom.value(node)
    }

    pub fn set_node_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.ensure_in_subtree(node)?;
        self.document.dom.set_value(node, value)
    }

    /// Returns `false` when an identical listener was already registered.
    pub fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: BoundHandler,
    ) -> Result<bool> {
        self.document.dom.ensure_valid(node)?;
        let added = self.document.listeners.add(
            node,
            event_type,
            Listener {
                capture: false,
                callback: ListenerCallback::Element(handler),
            },
        );
        log::trace!(
            "listener {} on {} for {event_type}: {}",
            handler.name(),
            self.document.node_label(node),
            if added { "added" } else { "already present" }
        );
        Ok(added)
    }

    pub fn remove_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: BoundHandler,
    ) -> bool {
        self.document.listeners.remove(
            node,
            event_type,
            &Listener {
                capture: false,
                callback: ListenerCallback::Element(handler),
            },
        )
    }

    /// Dispatches an event on the host and returns its final state.
    pub fn dispatch(&mut self, event: EventState) -> Result<EventState> {
        let event = EventState {
            target: self.host,
            current_target: self.host,
            ..event
        };
        self.document.dispatch_event(event)
    }

    /// Inserts `css` into the document the first time `key` is seen.
    pub fn inject_style_once(&mut self, key: &str, css: &str) -> Result<bool> {
        self.document.inject_style_once(key, css)
    }

    fn ensure_in_subtree(&self, node: NodeId) -> Result<()> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.host {
                return Ok(());
            }
            cursor = self.document.dom.parent(current);
        }
        Err(Error::HierarchyRequest(format!(
            "{} is outside of {}",
            self.document.node_label(node),
            self.document.node_label(self.host)
        )))
    }
}

impl Document {
    /// Registers a custom element and upgrades matching elements already in
    /// the document.
    pub fn define<F>(&mut self, name: &str, observed_attributes: &[&str], constructor: F) -> Result<()>
    where
        F: Fn(&mut ElementContext<'_>) -> Result<Box<dyn CustomElement>> + 'static,
    {
        self.registry.insert(
            name,
            ElementDefinition {
                observed_attributes: observed_attributes
                    .iter()
                    .map(|attr| attr.to_ascii_lowercase())
                    .collect(),
                constructor: Rc::new(constructor),
            },
        )?;
        log::debug!("defined custom element <{name}>");

        let candidates = self.dom.subtree_elements(self.dom.root);
        for node in candidates {
            if self.dom.tag_name(node) == Some(name) {
                self.upgrade(node)?;
            }
        }
        self.flush_reactions()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.registry.is_defined(name)
    }

    /// Whether a component instance is attached to `node`.
    pub fn is_upgraded(&self, node: NodeId) -> bool {
        self.instances.contains_key(&node) || self.busy.contains(&node)
    }

    /// Constructs the component for `node` if its tag is defined and it has
    /// none yet, then queues the initial reactions.
    pub(crate) fn upgrade(&mut self, node: NodeId) -> Result<()> {
        if self.is_upgraded(node) {
            return Ok(());
        }
        let Some(definition) = self
            .dom
            .tag_name(node)
            .and_then(|tag| self.registry.get(tag))
            .cloned()
        else {
            return Ok(());
        };

        let instance = {
            self.busy.insert(node);
            let mut ctx = ElementContext::new(self, node);
            let result = (definition.constructor)(&mut ctx);
            self.busy.remove(&node);
            result?
        };
        self.instances.insert(node, instance);
        self.trace_line(format!("[element] upgraded {}", self.node_label(node)));

        for name in &definition.observed_attributes {
            if let Some(value) = self.dom.attr(node, name) {
                self.reactions.push_back(Reaction {
                    host: node,
                    kind: ReactionKind::AttributeChanged {
                        name: name.clone(),
                        old: None,
                        new: Some(value),
                    },
                });
            }
        }
        if self.dom.is_connected(node) {
            self.reactions.push_back(Reaction {
                host: node,
                kind: ReactionKind::Mount,
            });
        }
        Ok(())
    }

    /// Upgrades or queues mount reactions for every element of a subtree that
    /// just became connected.
    pub(crate) fn connect_subtree(&mut self, root: NodeId) -> Result<()> {
        if !self.dom.is_connected(root) {
            return Ok(());
        }
        for node in self.dom.subtree_elements(root) {
            if self.is_upgraded(node) {
                self.reactions.push_back(Reaction {
                    host: node,
                    kind: ReactionKind::Mount,
                });
            } else {
                self.upgrade(node)?;
            }
        }
        Ok(())
    }

    /// Unmount reactions for the upgraded elements of a connected subtree.
    /// Callers queue them only once the disconnecting tree change succeeded.
    pub(crate) fn unmount_reactions(&self, root: NodeId) -> Vec<Reaction> {
        if !self.dom.is_connected(root) {
            return Vec::new();
        }
        self.dom
            .subtree_elements(root)
            .into_iter()
            .filter(|node| self.is_upgraded(*node))
            .map(|host| Reaction {
                host,
                kind: ReactionKind::Unmount,
            })
            .collect()
    }

    pub(crate) fn queue_attribute_reaction(
        &mut self,
        node: NodeId,
        name: &str,
        old: Option<String>,
        new: Option<String>,
    ) {
        if !self.is_upgraded(node) {
            return;
        }
        let name = name.to_ascii_lowercase();
        let observed = self
            .dom
            .tag_name(node)
            .and_then(|tag| self.registry.get(tag))
            .is_some_and(|definition| definition.observed_attributes.contains(&name));
        if observed {
            self.reactions.push_back(Reaction {
                host: node,
                kind: ReactionKind::AttributeChanged { name, old, new },
            });
        }
    }

    /// Runs queued reactions in order. Reactions whose element is in the
    /// middle of a hook stay queued until that hook returns.
    ///
    /// A flush requested while another one is running returns at once; the
    /// running flush picks up the new reactions behind the older ones.
    pub(crate) fn flush_reactions(&mut self) -> Result<()> {
        if self.flushing {
            return Ok(());
        }
        self.flushing = true;
        let result = self.drain_reactions();
        self.flushing = false;
        result
    }

    fn drain_reactions(&mut self) -> Result<()> {
        let mut deferred = VecDeque::new();
        while let Some(reaction) = self.reactions.pop_front() {
            if self.busy.contains(&reaction.host) {
                deferred.push_back(reaction);
                continue;
            }
            if let Err(err) = self.run_reaction(&reaction) {
                // Keep what has not run yet so a later flush can deliver it.
                deferred.append(&mut self.reactions);
                self.reactions = deferred;
                return Err(err);
            }
        }
        self.reactions = deferred;
        Ok(())
    }

    fn run_reaction(&mut self, reaction: &Reaction) -> Result<()> {
        let host = reaction.host;
        let label = self.node_label(host);
        match &reaction.kind {
            ReactionKind::Mount => {
                // Stale if the element was detached again before delivery.
                if !self.dom.is_connected(host) {
                    return Ok(());
                }
                self.trace_line(format!("[element] mount {label}"));
                self.run_element_callback(host, |element, ctx| element.on_mount(ctx))?;
            }
            ReactionKind::Unmount => {
                self.trace_line(format!("[element] unmount {label}"));
                self.run_element_callback(host, |element, ctx| element.on_unmount(ctx))?;
            }
            ReactionKind::AttributeChanged { name, old, new } => {
                self.trace_line(format!(
                    "[element] attribute {label} {name}: {old:?} -> {new:?}"
                ));
                self.run_element_callback(host, |element, ctx| {
                    element.on_attribute_change(ctx, name, old.as_deref(), new.as_deref())
                })?;
            }
        }
        Ok(())
    }

    /// Checks the component of `host` out, runs `f` on it and puts it back.
    /// Returns `Ok(false)` when `host` has no component or its component is
    /// already running.
    pub(crate) fn run_element_callback<F>(&mut self, host: NodeId, f: F) -> Result<bool>
    where
        F: FnOnce(&mut dyn CustomElement, &mut ElementContext<'_>) -> Result<()>,
    {
        let Some(mut instance) = self.instances.remove(&host) else {
            return Ok(false);
        };
        self.busy.insert(host);
        let result = {
            let mut ctx = ElementContext::new(self, host);
            f(instance.as_mut(), &mut ctx)
        };
        self.busy.remove(&host);
        self.instances.insert(host, instance);
        result?;
        self.flush_reactions()?;
        Ok(true)
    }
}
