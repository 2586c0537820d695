//! Headless in-memory document
//!
//! Implements [`Backend`] without a browser. Every mutation is recorded in
//! an operation log so callers can see exactly what a render touched.

use crate::backend::Backend;
use crate::props::{Event, Listener};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Handle to a node of a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw index
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Recorded mutation
#[derive(Debug, Clone, PartialEq)]
pub enum DomOp {
    /// Node created
    Create(NodeId),
    /// Node inserted or moved
    Insert {
        parent: NodeId,
        node: NodeId,
        anchor: Option<NodeId>,
    },
    /// Node detached
    Remove(NodeId),
    /// Property assigned
    SetProperty(NodeId, String, Value),
    /// Attribute set
    SetAttribute(NodeId, String, String),
    /// Attribute removed
    RemoveAttribute(NodeId, String),
    /// Style entry set
    SetStyle(NodeId, String, String),
    /// Listener attached
    AddListener(NodeId, String),
    /// Listener detached
    RemoveListener(NodeId, String),
}

impl DomOp {
    /// True for operations that change tree structure
    pub fn is_structural(&self) -> bool {
        matches!(self, DomOp::Insert { .. } | DomOp::Remove(_))
    }
}

#[derive(Debug, Clone)]
enum MemKind {
    Element { tag: String, svg: bool },
    Text { text: String },
}

#[derive(Debug, Clone)]
struct MemNode {
    kind: MemKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    properties: BTreeMap<String, Value>,
    style: BTreeMap<String, String>,
    listeners: Vec<(String, Listener)>,
}

impl MemNode {
    fn new(kind: MemKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            style: BTreeMap::new(),
            listeners: Vec::new(),
        }
    }
}

/// Element properties assigned directly instead of as attributes
const ELEMENT_PROPERTIES: &[&str] = &["value", "checked", "selected"];
/// Text node properties, all aliases of the text content
const TEXT_PROPERTIES: &[&str] = &["nodeValue", "textContent", "data"];

/// In-memory document
#[derive(Debug, Default)]
pub struct MemoryDocument {
    nodes: Vec<MemNode>,
    ops: Vec<DomOp>,
}

impl MemoryDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached container element (not recorded as an operation)
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.push(MemKind::Element {
            tag: tag.to_string(),
            svg: false,
        })
    }

    fn push(&mut self, kind: MemKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MemNode::new(kind));
        id
    }

    fn node(&self, id: NodeId) -> Option<&MemNode> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut MemNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
    }

    /// Children of a node in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Tag name of an element
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            MemKind::Element { tag, .. } => Some(tag),
            MemKind::Text { .. } => None,
        }
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            MemKind::Text { text } => Some(text),
            MemKind::Element { .. } => None,
        }
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for child in self.children(id) {
            self.collect_text(*child, out);
        }
    }

    /// Attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attributes.get(name).map(String::as_str)
    }

    /// Property value
    pub fn property(&self, id: NodeId, name: &str) -> Option<&Value> {
        self.node(id)?.properties.get(name)
    }

    /// Inline style entry
    pub fn style(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id)?.style.get(key).map(String::as_str)
    }

    /// Number of listeners for an event
    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.node(id)
            .map(|n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Deliver an event to the listeners of a node. Returns how many ran.
    pub fn dispatch(&self, id: NodeId, event: &Event) -> usize {
        let listeners: Vec<Listener> = self
            .node(id)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|(e, _)| *e == event.kind)
                    .map(|(_, l)| l.clone())
                    .collect()
            })
            .unwrap_or_default();

        for listener in &listeners {
            listener.call(event);
        }
        listeners.len()
    }

    /// Serialize the children of `id` as markup
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    /// Serialize `id` and its subtree as markup
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            MemKind::Text { text } => out.push_str(&escape(text)),
            MemKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {}=\"{}\"", name, escape(value));
                }
                if !node.style.is_empty() {
                    let style: Vec<String> =
                        node.style.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                    let _ = write!(out, " style=\"{}\"", escape(&style.join("; ")));
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }

    /// Recorded operations
    pub fn ops(&self) -> &[DomOp] {
        &self.ops
    }

    /// Take and clear recorded operations
    pub fn take_ops(&mut self) -> Vec<DomOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of nodes ever created
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

impl Backend for MemoryDocument {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str, svg: bool) -> NodeId {
        let id = self.push(MemKind::Element {
            tag: tag.to_string(),
            svg,
        });
        self.ops.push(DomOp::Create(id));
        id
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.push(MemKind::Text {
            text: text.to_string(),
        });
        self.ops.push(DomOp::Create(id));
        id
    }

    fn is_text(&self, node: &NodeId) -> bool {
        matches!(self.node(*node).map(|n| &n.kind), Some(MemKind::Text { .. }))
    }

    fn is_svg(&self, node: &NodeId) -> bool {
        matches!(
            self.node(*node).map(|n| &n.kind),
            Some(MemKind::Element { svg: true, .. })
        )
    }

    fn has_property(&self, node: &NodeId, name: &str) -> bool {
        if self.is_text(node) {
            TEXT_PROPERTIES.contains(&name)
        } else {
            ELEMENT_PROPERTIES.contains(&name)
        }
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: &Value) {
        let id = *node;
        let Some(n) = self.node_mut(id) else {
            return;
        };
        match &mut n.kind {
            MemKind::Text { text } => *text = value.to_string(),
            MemKind::Element { .. } => {
                n.properties.insert(name.to_string(), value.clone());
            }
        }
        self.ops.push(DomOp::SetProperty(id, name.to_string(), value.clone()));
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(*node) {
            n.attributes.insert(name.to_string(), value.to_string());
            self.ops.push(DomOp::SetAttribute(*node, name.to_string(), value.to_string()));
        }
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        if let Some(n) = self.node_mut(*node) {
            n.attributes.remove(name);
            self.ops.push(DomOp::RemoveAttribute(*node, name.to_string()));
        }
    }

    fn set_style(&mut self, node: &NodeId, key: &str, value: &str) {
        if let Some(n) = self.node_mut(*node) {
            if value.is_empty() {
                n.style.remove(key);
            } else {
                n.style.insert(key.to_string(), value.to_string());
            }
            self.ops.push(DomOp::SetStyle(*node, key.to_string(), value.to_string()));
        }
    }

    fn add_listener(&mut self, node: &NodeId, event: &str, listener: &Listener) {
        if let Some(n) = self.node_mut(*node) {
            n.listeners.push((event.to_string(), listener.clone()));
            self.ops.push(DomOp::AddListener(*node, event.to_string()));
        }
    }

    fn remove_listener(&mut self, node: &NodeId, event: &str, listener: &Listener) {
        if let Some(n) = self.node_mut(*node) {
            n.listeners.retain(|(e, l)| !(e == event && l.ptr_eq(listener)));
            self.ops.push(DomOp::RemoveListener(*node, event.to_string()));
        }
    }

    fn insert_before(&mut self, parent: &NodeId, node: &NodeId, anchor: Option<&NodeId>) {
        if self.node(*parent).is_none() || self.node(*node).is_none() || parent == node {
            log::warn!("Ignoring insert of {:?} into {:?}", node, parent);
            return;
        }
        if anchor == Some(node) {
            return;
        }

        self.detach(*node);
        let index = {
            let siblings = self.children(*parent);
            anchor
                .and_then(|a| siblings.iter().position(|c| c == a))
                .unwrap_or(siblings.len())
        };
        if let Some(p) = self.node_mut(*parent) {
            p.children.insert(index, *node);
        }
        if let Some(n) = self.node_mut(*node) {
            n.parent = Some(*parent);
        }
        self.ops.push(DomOp::Insert {
            parent: *parent,
            node: *node,
            anchor: anchor.copied(),
        });
    }

    fn remove(&mut self, node: &NodeId) {
        if self.parent(*node).is_some() {
            self.detach(*node);
            self.ops.push(DomOp::Remove(*node));
        }
    }
}
