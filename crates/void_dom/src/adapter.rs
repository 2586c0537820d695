//! Live-tree adapter: node creation, prop diffing and placement

use crate::backend::Backend;
use crate::props::{Prop, Props, Style};
use crate::value::Value;

/// What kind of node a description asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// Host element with a tag name
    Element(&'a str),
    /// Text node
    Text,
    /// Component; owns no live node
    Component,
}

/// Prop name that never reaches the live node
const CHILDREN: &str = "children";
/// Prop name diffed as an inline style map
const STYLE: &str = "style";

/// The operations the reconciler needs from a live tree
pub struct Adapter<B: Backend> {
    backend: B,
}

impl<B: Backend> Adapter<B> {
    /// Wrap a backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Unwrap the backend
    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Create a node for a host or text description and apply its initial
    /// props. Components get `None`.
    pub fn create_node(&mut self, kind: NodeKind<'_>, props: &Props, svg: bool) -> Option<B::Node> {
        let node = match kind {
            NodeKind::Element(tag) => self.backend.create_element(tag, svg),
            NodeKind::Text => self.backend.create_text(""),
            NodeKind::Component => return None,
        };
        self.update_node(&node, &Props::new(), props);
        Some(node)
    }

    /// Apply the difference between `old` and `new` props to a node
    pub fn update_node(&mut self, node: &B::Node, old: &Props, new: &Props) {
        for (name, a) in old.iter() {
            self.apply(node, name, Some(a), new.get(name));
        }
        for (name, b) in new.iter() {
            if !old.contains(name) {
                self.apply(node, name, None, Some(b));
            }
        }
    }

    /// Detach a node from the live tree
    pub fn remove_node(&mut self, node: &B::Node) {
        self.backend.remove(node);
    }

    /// Insert or move `node` before `anchor` inside `parent`
    pub fn insert_before(&mut self, parent: &B::Node, node: &B::Node, anchor: Option<&B::Node>) {
        self.backend.insert_before(parent, node, anchor);
    }

    fn apply(&mut self, node: &B::Node, name: &str, a: Option<&Prop>, b: Option<&Prop>) {
        if a == b || name == CHILDREN {
            return;
        }

        if name == STYLE && !matches!(b, Some(Prop::Value(Value::String(_)))) {
            let empty = Style::new();
            let old = match a {
                Some(Prop::Style(s)) => s,
                _ => &empty,
            };
            let new = match b {
                Some(Prop::Style(s)) => s,
                _ => &empty,
            };
            self.apply_style(node, old, new);
            return;
        }

        if let Some(event) = event_name(name) {
            if let Some(Prop::Listener(old)) = a {
                self.backend.remove_listener(node, &event, old);
            }
            if let Some(Prop::Listener(new)) = b {
                self.backend.add_listener(node, &event, new);
            }
            return;
        }

        let value = b.and_then(Prop::as_value);

        if self.backend.has_property(node, name) && !self.backend.is_svg(node) {
            let empty = Value::String(String::new());
            self.backend.set_property(node, name, value.unwrap_or(&empty));
        } else if self.backend.is_text(node) {
            // text nodes carry no attributes
        } else if value.map_or(true, Value::is_nothing) {
            self.backend.remove_attribute(node, name);
        } else if let Some(value) = value {
            self.backend.set_attribute(node, name, &value.to_string());
        }
    }

    fn apply_style(&mut self, node: &B::Node, old: &Style, new: &Style) {
        for (key, a) in old {
            let b = new.get(key);
            if Some(a) != b {
                let text = b.map(Value::to_string).unwrap_or_default();
                self.backend.set_style(node, key, &text);
            }
        }
        for (key, b) in new {
            if !old.contains_key(key) {
                self.backend.set_style(node, key, &b.to_string());
            }
        }
    }
}

/// `onClick` -> `click`
fn event_name(name: &str) -> Option<String> {
    match name.strip_prefix("on") {
        Some(rest) if !rest.is_empty() => Some(rest.to_lowercase()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onMouseDown").as_deref(), Some("mousedown"));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("class"), None);
    }
}
