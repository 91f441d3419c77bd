use super::*;

/// Attribute carried by every injected `<style>` element; its value is the
/// injection key.
pub(crate) const INJECTED_STYLE_ATTR: &str = "data-injected-style";

/// Style keys already injected into a document. One document is one page
/// realm, so this set plays the role of a page-wide "already injected" flag.
#[derive(Debug, Default)]
pub(crate) struct StyleState {
    injected: HashSet<String>,
}

impl StyleState {
    /// Marks `key` as injected. Returns `false` when it already was.
    fn claim(&mut self, key: &str) -> bool {
        self.injected.insert(key.to_string())
    }

    pub(crate) fn is_injected(&self, key: &str) -> bool {
        self.injected.contains(key)
    }
}

impl Document {
    /// Inserts a `<style>` holding `css` the first time `key` is seen by this
    /// document. Returns whether a stylesheet was inserted.
    pub fn inject_style_once(&mut self, key: &str, css: &str) -> Result<bool> {
        if !self.styles.claim(key) {
            return Ok(false);
        }

        let parent = self.style_parent();
        let mut attrs = HashMap::new();
        attrs.insert(INJECTED_STYLE_ATTR.to_string(), key.to_string());
        let style = self
            .dom
            .create_element(Some(parent), "style".to_string(), attrs);
        self.dom.create_text(Some(style), css.to_string());

        log::debug!("injected stylesheet {key} into {}", self.node_label(parent));
        self.trace_line(format!("[style] injected {key}"));
        Ok(true)
    }

    pub fn has_injected_style(&self, key: &str) -> bool {
        self.styles.is_injected(key)
    }

    // Never inside an arbitrary element: components rebuild their own children.
    fn style_parent(&self) -> NodeId {
        match self.dom.query_selector("head") {
            Ok(Some(head)) => head,
            _ => self.dom.root,
        }
    }
}
