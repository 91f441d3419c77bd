//! A quantity stepper custom element and the small, deterministic DOM host
//! it runs on.
//!
//! ```no_run
//! use quantity_modifier::{Document, QuantityModifier};
//!
//! # fn main() -> quantity_modifier::Result<()> {
//! let mut doc = Document::from_html(r#"<quantity-modifier min="1" max="5" value="2"></quantity-modifier>"#)?;
//! QuantityModifier::define(&mut doc)?;
//! let changes = doc.listen("quantity-modifier", "quantity-modifier:change")?;
//! doc.click("[data-action-increment]")?;
//! doc.assert_value("[data-quantity-modifier-field]", "3")?;
//! assert_eq!(doc.take_observed_events().len(), 1);
//! # let _ = changes;
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

mod config;
mod custom_elements;
mod document;
mod dom;
mod events;
mod html;
mod numeric;
mod quantity_modifier;
mod selector;
mod style;

pub use config::QuantityModifierConfig;
pub use custom_elements::{CustomElement, ElementContext};
pub use document::{Document, TraceSettings};
pub use dom::NodeId;
pub use events::{BoundHandler, EventPhase, EventState, ListenerId, ObservedEvent};
pub use numeric::{clamp_upper_first, parse_int_or, parse_leading_int};
pub use quantity_modifier::{
    CHANGE_EVENT, DECREMENT_MARKER, FIELD_MARKER, INCREMENT_MARKER, QuantityChange,
    QuantityModifier, QuantityModifierView, TAG_NAME,
};

pub(crate) use custom_elements::{CustomElementRegistry, Reaction};
pub(crate) use dom::Dom;
pub(crate) use events::{Listener, ListenerCallback, ListenerStore};
pub(crate) use html::parse_html;
pub(crate) use selector::{
    SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorStep, parse_selector_groups,
};
pub(crate) use style::StyleState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("type mismatch for {selector}: expected {expected}, actual {actual}")]
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    #[error(
        "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
    )]
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
    #[error("invalid node: {0}")]
    InvalidNode(String),
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(String),
    #[error("invalid custom element name: {0}")]
    InvalidCustomElementName(String),
    #[error("custom element already defined: {0}")]
    DuplicateDefinition(String),
    #[error("event detail error: {0}")]
    EventDetail(String),
    #[error("config error: {0}")]
    Config(String),
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = chars.next() else {
            return out;
        };
        out.push(ch);
    }
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests;
