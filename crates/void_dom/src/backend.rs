//! Low-level live-tree primitives
//!
//! A backend is a thin wrapper over a concrete document (a browser DOM
//! through bindings, or the headless [`MemoryDocument`](crate::MemoryDocument)).
//! All diffing rules live in [`Adapter`](crate::Adapter); backends only
//! perform single mutations.

use crate::props::Listener;
use crate::value::Value;
use std::fmt::Debug;
use std::hash::Hash;

/// Mutation primitives of a live document
pub trait Backend {
    /// Handle to a live node
    type Node: Clone + Eq + Hash + Debug + 'static;

    /// Create a detached element
    fn create_element(&mut self, tag: &str, svg: bool) -> Self::Node;

    /// Create a detached text node
    fn create_text(&mut self, text: &str) -> Self::Node;

    /// Check if the node is a text node
    fn is_text(&self, node: &Self::Node) -> bool;

    /// Check if the node lives in the SVG namespace
    fn is_svg(&self, node: &Self::Node) -> bool;

    /// Check if `name` is a native property of the node (as opposed to an attribute)
    fn has_property(&self, node: &Self::Node, name: &str) -> bool;

    /// Assign a native property
    fn set_property(&mut self, node: &Self::Node, name: &str, value: &Value);

    /// Set an attribute
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    /// Remove an attribute
    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Set one inline style entry (empty string clears it)
    fn set_style(&mut self, node: &Self::Node, key: &str, value: &str);

    /// Attach an event listener
    fn add_listener(&mut self, node: &Self::Node, event: &str, listener: &Listener);

    /// Detach an event listener
    fn remove_listener(&mut self, node: &Self::Node, event: &str, listener: &Listener);

    /// Insert `node` into `parent` before `anchor`, or append when `anchor`
    /// is `None`. A node that is already attached is moved.
    fn insert_before(&mut self, parent: &Self::Node, node: &Self::Node, anchor: Option<&Self::Node>);

    /// Detach a node from its parent
    fn remove(&mut self, node: &Self::Node);
}
