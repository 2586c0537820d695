//! The fiber: one rendered node of the tree

use crate::action::Action;
use crate::arena::FiberId;
use crate::element::{Component, Element, ElementKind, Identity, Key, NodeRef, TypeTag};
use crate::hooks::Hooks;
use std::mem;
use void_dom::{NodeKind, Props};

/// What a fiber renders
#[derive(Debug, Clone, PartialEq)]
pub enum FiberKind {
    /// Container root, owns the container node
    Root,
    /// Host element
    Host(String),
    /// Text node
    Text,
    /// User component, owns no node
    Component(Component),
}

impl FiberKind {
    /// Check if the fiber is a component
    pub fn is_component(&self) -> bool {
        matches!(self, FiberKind::Component(_))
    }

    /// Type tag for identity matching
    pub fn type_tag(&self) -> TypeTag {
        match self {
            FiberKind::Root => TypeTag::Root,
            FiberKind::Host(tag) => TypeTag::Host(tag.clone()),
            FiberKind::Text => TypeTag::Text,
            FiberKind::Component(c) => TypeTag::Component(c.type_id()),
        }
    }

    /// Node kind for the adapter
    pub fn node_kind(&self) -> NodeKind<'_> {
        match self {
            FiberKind::Root | FiberKind::Component(_) => NodeKind::Component,
            FiberKind::Host(tag) => NodeKind::Element(tag),
            FiberKind::Text => NodeKind::Text,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &str {
        match self {
            FiberKind::Root => "#root",
            FiberKind::Host(tag) => tag.as_str(),
            FiberKind::Text => "#text",
            FiberKind::Component(c) => c.name(),
        }
    }
}

impl From<ElementKind> for FiberKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Host(tag) => FiberKind::Host(tag),
            ElementKind::Text => FiberKind::Text,
            ElementKind::Component(c) => FiberKind::Component(c),
        }
    }
}

/// One node of the rendered tree.
///
/// `child` and `sibling` enumerate the current children in render order;
/// `kids` holds the same list as a vector for the next diff.
pub struct Fiber<N> {
    pub(crate) kind: FiberKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Props,
    pub(crate) old_props: Option<Props>,
    pub(crate) children: Vec<Element>,
    pub(crate) node: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) kids: Vec<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) dirty: bool,
    pub(crate) action: Option<Action>,
    pub(crate) hooks: Hooks,
    pub(crate) node_ref: Option<NodeRef>,
    pub(crate) svg: bool,
}

impl<N> Fiber<N> {
    fn with_kind(kind: FiberKind) -> Self {
        Self {
            kind,
            key: None,
            props: Props::new(),
            old_props: None,
            children: Vec::new(),
            node: None,
            parent: None,
            child: None,
            sibling: None,
            kids: Vec::new(),
            deletions: Vec::new(),
            dirty: false,
            action: None,
            hooks: Hooks::default(),
            node_ref: None,
            svg: false,
        }
    }

    /// Create a root fiber for a container node
    pub fn root(container: N) -> Self {
        let mut fiber = Self::with_kind(FiberKind::Root);
        fiber.node = Some(container);
        fiber
    }

    /// Create a fresh fiber from a description
    pub fn from_element(element: Element) -> Self {
        let mut fiber = Self::with_kind(element.kind.into());
        fiber.key = element.key;
        fiber.props = element.props;
        fiber.children = element.children;
        fiber.node_ref = element.node_ref;
        fiber
    }

    /// Take a matching description for a re-render, keeping node and hooks
    pub(crate) fn reuse(&mut self, element: Element) {
        self.old_props = Some(mem::replace(&mut self.props, element.props));
        self.kind = element.kind.into();
        self.children = element.children;
        self.node_ref = element.node_ref;
    }

    /// Kind
    pub fn kind(&self) -> &FiberKind {
        &self.kind
    }

    /// Explicit key
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Identity the differ matches on
    pub fn identity(&self) -> Identity {
        Identity {
            key: self.key.clone(),
            ty: self.kind.type_tag(),
        }
    }

    /// Current props
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Live node (`None` for components and not yet created nodes)
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    /// Parent fiber
    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// First child
    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    /// Next sibling
    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Children in render order
    pub fn kids(&self) -> &[FiberId] {
        &self.kids
    }

    /// Check if an update is pending
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Pending action, if any
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Hook slots
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Check if the fiber lives in the SVG namespace
    pub fn is_svg(&self) -> bool {
        self.svg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{h, text};

    #[test]
    fn test_from_element() {
        let fiber: Fiber<u32> = Fiber::from_element(h("li").key("a").prop("id", 1).child(text("x")));
        assert_eq!(fiber.kind(), &FiberKind::Host("li".into()));
        assert_eq!(fiber.key(), Some("a"));
        assert_eq!(fiber.children.len(), 1);
        assert!(fiber.node().is_none());
        assert!(fiber.action().is_none());
    }

    #[test]
    fn test_reuse_keeps_previous_props() {
        let mut fiber: Fiber<u32> = Fiber::from_element(h("p").prop("n", 1));
        fiber.node = Some(9);
        fiber.reuse(h("p").prop("n", 2));

        assert_eq!(fiber.old_props.as_ref().and_then(|p| p.value("n")), Some(&1.into()));
        assert_eq!(fiber.props().value("n"), Some(&2.into()));
        assert_eq!(fiber.node(), Some(&9));
    }
}
