//! The `<quantity-modifier>` element: a decrement button, a numeric field and
//! an increment button bound to the element's `min`, `max` and `value`
//! attributes.

use super::*;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub const TAG_NAME: &str = "quantity-modifier";
pub const CHANGE_EVENT: &str = "quantity-modifier:change";

pub const DECREMENT_MARKER: &str = "data-action-decrement";
pub const INCREMENT_MARKER: &str = "data-action-increment";
pub const FIELD_MARKER: &str = "data-quantity-modifier-field";

const DECREMENT_SELECTOR: &str = "[data-action-decrement]";
const INCREMENT_SELECTOR: &str = "[data-action-increment]";
const FIELD_SELECTOR: &str = "[data-quantity-modifier-field]";

const OBSERVED_ATTRIBUTES: [&str; 3] = ["min", "max", "value"];

const MINUS_ICON_PATH: &str = "M368 224H16c-8.84 0-16 7.16-16 16v32c0 8.84 7.16 16 16 16h352c8.84 0 16-7.16 16-16v-32c0-8.84-7.16-16-16-16z";
const PLUS_ICON_PATH: &str = "M368 224H224V80c0-8.84-7.16-16-16-16h-32c-8.84 0-16 7.16-16 16v144H16c-8.84 0-16 7.16-16 16v32c0 8.84 7.16 16 16 16h144v144c0 8.84 7.16 16 16 16h32c8.84 0 16-7.16 16-16V288h144c8.84 0 16-7.16 16-16v-32c0-8.84-7.16-16-16-16z";

/// Payload of the change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChange {
    pub value: i64,
}

/// Component mounted on every `<quantity-modifier>` element.
pub struct QuantityModifier {
    config: Rc<QuantityModifierConfig>,
    on_decrement: BoundHandler,
    on_increment: BoundHandler,
    on_input: BoundHandler,
}

struct Markers {
    decrement: Option<NodeId>,
    field: Option<NodeId>,
    increment: Option<NodeId>,
}

impl QuantityModifier {
    /// Registers `<quantity-modifier>` with the default configuration.
    pub fn define(doc: &mut Document) -> Result<()> {
        Self::define_with_config(doc, QuantityModifierConfig::default())
    }

    pub fn define_with_config(doc: &mut Document, config: QuantityModifierConfig) -> Result<()> {
        config.validate()?;
        let config = Rc::new(config);
        let tag_name = config.tag_name.clone();
        if !doc.is_defined(&tag_name) {
            doc.quantity_configs
                .insert(tag_name.clone(), Rc::clone(&config));
        }
        doc.define(&tag_name, &OBSERVED_ATTRIBUTES, move |ctx| {
            let element = QuantityModifier::new(ctx, Rc::clone(&config))?;
            Ok(Box::new(element) as Box<dyn CustomElement>)
        })
    }

    fn new(ctx: &mut ElementContext<'_>, config: Rc<QuantityModifierConfig>) -> Result<Self> {
        let tag_name = &config.tag_name;
        ctx.inject_style_once(&format!("{tag_name}-spin-buttons"), &spin_button_css(tag_name))?;

        let host = ctx.host();
        Ok(Self {
            config,
            on_decrement: BoundHandler::new(host, "decrement"),
            on_increment: BoundHandler::new(host, "increment"),
            on_input: BoundHandler::new(host, "input"),
        })
    }

    fn min(&self, ctx: &ElementContext<'_>) -> i64 {
        parse_int_or(ctx.attribute("min").as_deref(), self.config.default_min)
    }

    fn max(&self, ctx: &ElementContext<'_>) -> i64 {
        parse_int_or(ctx.attribute("max").as_deref(), self.config.default_max)
    }

    fn value(&self, ctx: &ElementContext<'_>) -> i64 {
        parse_int_or(ctx.attribute("value").as_deref(), self.config.default_value)
    }

    fn set_value(&self, ctx: &mut ElementContext<'_>, value: i64) -> Result<()> {
        ctx.set_attribute("value", &value.to_string())
    }

    fn markers(&self, ctx: &ElementContext<'_>) -> Result<Markers> {
        Ok(Markers {
            decrement: ctx.query(DECREMENT_SELECTOR)?,
            field: ctx.query(FIELD_SELECTOR)?,
            increment: ctx.query(INCREMENT_SELECTOR)?,
        })
    }

    fn render(&self, ctx: &mut ElementContext<'_>) -> Result<()> {
        if let Markers {
            decrement: Some(_),
            field: Some(field),
            increment: Some(_),
        } = self.markers(ctx)?
        {
            if ctx.node_attribute(field, "type").as_deref() != Some("number") {
                ctx.set_node_attribute(field, "type", "number")?;
            }
            return self.sync_field(ctx, field);
        }

        log::debug!("building quantity modifier markup for node {:?}", ctx.host());
        let markup = render_markup(self.value(ctx), self.min(ctx), self.max(ctx));
        ctx.set_inner_html(&markup)
    }

    fn bindings(&self) -> [(&'static str, &'static str, BoundHandler); 3] {
        [
            (DECREMENT_SELECTOR, "click", self.on_decrement),
            (INCREMENT_SELECTOR, "click", self.on_increment),
            (FIELD_SELECTOR, "input", self.on_input),
        ]
    }

    fn attach_listeners(&self, ctx: &mut ElementContext<'_>) -> Result<()> {
        for (selector, event_type, handler) in self.bindings() {
            if let Some(node) = ctx.query(selector)? {
                ctx.add_listener(node, event_type, handler)?;
            }
        }
        Ok(())
    }

    fn remove_listeners(&self, ctx: &mut ElementContext<'_>) -> Result<()> {
        for (selector, event_type, handler) in self.bindings() {
            if let Some(node) = ctx.query(selector)? {
                ctx.remove_listener(node, event_type, handler);
            }
        }
        Ok(())
    }

    fn handle_decrement(&self, ctx: &mut ElementContext<'_>) -> Result<()> {
        let next = self.value(ctx).saturating_sub(1).max(self.min(ctx));
        self.update_value(ctx, next)
    }

    fn handle_increment(&self, ctx: &mut ElementContext<'_>) -> Result<()> {
        let next = self.value(ctx).saturating_add(1).min(self.max(ctx));
        self.update_value(ctx, next)
    }

    fn handle_input(&self, ctx: &mut ElementContext<'_>, event: &EventState) -> Result<()> {
        let text = ctx.node_value(event.target)?;
        // Half-typed text stays as is until it parses.
        let Some(typed) = parse_leading_int(&text) else {
            return Ok(());
        };
        let clamped = clamp_upper_first(typed, self.min(ctx), self.max(ctx));
        self.update_value(ctx, clamped)
    }

    fn update_value(&self, ctx: &mut ElementContext<'_>, next: i64) -> Result<()> {
        if next == self.value(ctx) {
            return Ok(());
        }
        self.set_value(ctx, next)?;
        self.update_input(ctx)?;
        self.dispatch_change(ctx, next)
    }

    fn update_input(&self, ctx: &mut ElementContext<'_>) -> Result<()> {
        match ctx.query(FIELD_SELECTOR)? {
            Some(field) => self.sync_field(ctx, field),
            None => Ok(()),
        }
    }

    fn sync_field(&self, ctx: &mut ElementContext<'_>, field: NodeId) -> Result<()> {
        let (value, min, max) = (self.value(ctx), self.min(ctx), self.max(ctx));
        ctx.set_node_value(field, &value.to_string())?;
        for (name, bound) in [("min", min), ("max", max)] {
            let bound = bound.to_string();
            if ctx.node_attribute(field, name).as_deref() != Some(bound.as_str()) {
                ctx.set_node_attribute(field, name, &bound)?;
            }
        }
        Ok(())
    }

    fn dispatch_change(&self, ctx: &mut ElementContext<'_>, value: i64) -> Result<()> {
        let detail = serde_json::to_value(QuantityChange { value })
            .map_err(|err| Error::EventDetail(err.to_string()))?;
        log::debug!("{} -> {value}", self.config.change_event);
        let event = EventState::new(&self.config.change_event, ctx.host())
            .bubbling(true)
            .with_detail(detail);
        ctx.dispatch(event)?;
        Ok(())
    }
}

impl CustomElement for QuantityModifier {
    fn on_mount(&mut self, ctx: &mut ElementContext<'_>) -> Result<()> {
        self.render(ctx)?;
        self.attach_listeners(ctx)
    }

    fn on_unmount(&mut self, ctx: &mut ElementContext<'_>) -> Result<()> {
        self.remove_listeners(ctx)
    }

    fn on_attribute_change(
        &mut self,
        ctx: &mut ElementContext<'_>,
        _name: &str,
        old: Option<&str>,
        new: Option<&str>,
    ) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.update_input(ctx)
    }

    fn handle_event(
        &mut self,
        ctx: &mut ElementContext<'_>,
        handler: BoundHandler,
        event: &mut EventState,
    ) -> Result<()> {
        if handler == self.on_decrement {
            self.handle_decrement(ctx)
        } else if handler == self.on_increment {
            self.handle_increment(ctx)
        } else if handler == self.on_input {
            self.handle_input(ctx, event)
        } else {
            Ok(())
        }
    }
}

fn render_markup(value: i64, min: i64, max: i64) -> String {
    format!(
        r#"<button {DECREMENT_MARKER} type="button"><svg class="svg-decrement" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 384 512"><title>decrement</title><path fill="currentColor" d="{MINUS_ICON_PATH}"></path></svg></button><input type="number" inputmode="numeric" pattern="[0-9]*" {FIELD_MARKER} value="{value}" min="{min}" max="{max}"><button {INCREMENT_MARKER} type="button"><svg class="svg-increment" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 384 512"><title>increment</title><path fill="currentColor" d="{PLUS_ICON_PATH}"></path></svg></button>"#
    )
}

fn spin_button_css(tag_name: &str) -> String {
    format!(
        "{tag_name} input[type=\"number\"]::-webkit-inner-spin-button, \
         {tag_name} input[type=\"number\"]::-webkit-outer-spin-button \
         {{ -webkit-appearance: none; margin: 0; }} \
         {tag_name} input[type=\"number\"] {{ -moz-appearance: textfield; appearance: textfield; }}"
    )
}

/// Read access to a quantity modifier element's attribute-backed state.
///
/// Works on any element, upgraded or not, since the state lives in its
/// attributes. Fallbacks come from the configuration its tag was defined
/// with.
#[derive(Debug, Clone, Copy)]
pub struct QuantityModifierView<'a> {
    doc: &'a Document,
    host: NodeId,
    defaults: (i64, i64, i64),
}

impl QuantityModifierView<'_> {
    pub fn min(&self) -> i64 {
        parse_int_or(self.doc.dom.attr(self.host, "min").as_deref(), self.defaults.0)
    }

    pub fn max(&self) -> i64 {
        parse_int_or(self.doc.dom.attr(self.host, "max").as_deref(), self.defaults.1)
    }

    pub fn value(&self) -> i64 {
        parse_int_or(self.doc.dom.attr(self.host, "value").as_deref(), self.defaults.2)
    }
}

impl Document {
    pub fn quantity_modifier(&self, selector: &str) -> Result<QuantityModifierView<'_>> {
        let host = self.select(selector)?;
        let config = self
            .dom
            .tag_name(host)
            .and_then(|tag| self.quantity_configs.get(tag))
            .map(|config| (config.default_min, config.default_max, config.default_value));
        let defaults = config.unwrap_or_else(|| {
            let config = QuantityModifierConfig::default();
            (config.default_min, config.default_max, config.default_value)
        });
        Ok(QuantityModifierView {
            doc: self,
            host,
            defaults,
        })
    }

    /// Programmatic `value` setter: writes the attribute, which the mounted
    /// component mirrors into its field. Emits no change event.
    pub fn set_quantity_value(&mut self, selector: &str, value: i64) -> Result<()> {
        self.set_attribute(selector, "value", &value.to_string())
    }
}
