//! Declarative tree descriptions
//!
//! An [`Element`] is a cheap, cloneable description of what should be on
//! screen. Components return lists of elements; the reconciler turns them
//! into fibers.
//!
//! ```text
//! h("div")
//!   .prop("id", "app")
//!   .on("click", |_| ..)
//!   .child(h("h1").child(text("0")))
//!   .child(Element::component(Counter).key("c"))
//! ```

use crate::hooks::Scope;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use void_dom::{Event, Listener, Prop, Props, Style, Value};

/// Explicit identity key
pub type Key = String;

/// Component render function
pub type RenderFn = fn(&mut Scope<'_>) -> Vec<Element>;

/// Props equality predicate for memoized components.
/// Returns true when the component can skip re-rendering.
pub type PropsEq = fn(&Props, &Props) -> bool;

/// Memoization mode of a component
#[derive(Clone, Copy)]
pub enum Memo {
    /// Always re-render with the parent
    Never,
    /// Skip when props are shallowly equal and no children are passed
    Shallow,
    /// Skip when the predicate says old and new props are equal
    With(PropsEq),
}

/// A user component: a render function plus its memo behavior.
/// Two components are the same type when they share the render function.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: RenderFn,
    memo: Memo,
}

impl Component {
    /// Create a new component
    pub const fn new(name: &'static str, render: RenderFn) -> Self {
        Self {
            name,
            render,
            memo: Memo::Never,
        }
    }

    /// Skip re-rendering when props are shallowly equal
    pub const fn memo(mut self) -> Self {
        self.memo = Memo::Shallow;
        self
    }

    /// Skip re-rendering when `eq(old, new)` holds
    pub const fn memo_with(mut self, eq: PropsEq) -> Self {
        self.memo = Memo::With(eq);
        self
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the memo mode
    pub fn memo_mode(&self) -> Memo {
        self.memo
    }

    /// Type identity used by the differ
    pub fn type_id(&self) -> usize {
        self.render as usize
    }

    pub(crate) fn render(&self, scope: &mut Scope<'_>) -> Vec<Element> {
        (self.render)(scope)
    }

    /// Check if rendering with `new` can be skipped
    pub(crate) fn is_unchanged(&self, old: &Props, new: &Props, children: &[Element]) -> bool {
        match self.memo {
            Memo::Never => false,
            Memo::Shallow => children.is_empty() && old.shallow_eq(new),
            Memo::With(eq) => eq(old, new),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}

/// Built-in component that renders its children as-is
pub const FRAGMENT: Component = Component::new("Fragment", render_fragment);

fn render_fragment(scope: &mut Scope<'_>) -> Vec<Element> {
    scope.children().to_vec()
}

/// What an element describes
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Host element with a tag name
    Host(String),
    /// Text node; the text lives in the `nodeValue` prop
    Text,
    /// User component
    Component(Component),
}

/// Type part of a fiber's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Container root
    Root,
    /// Host tag
    Host(String),
    /// Text node
    Text,
    /// Component render function address
    Component(usize),
}

/// Identity the differ matches on: explicit key plus type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    /// Explicit key
    pub key: Option<Key>,
    /// Type
    pub ty: TypeTag,
}

impl ElementKind {
    /// Type tag of this kind
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ElementKind::Host(tag) => TypeTag::Host(tag.clone()),
            ElementKind::Text => TypeTag::Text,
            ElementKind::Component(c) => TypeTag::Component(c.type_id()),
        }
    }
}

type RefCallback = Rc<dyn Fn(Option<&dyn Any>)>;

/// Receives a fiber's live node after each commit and `None` on removal
#[derive(Clone)]
pub enum NodeRef {
    /// Callback invoked with the node
    Callback(RefCallback),
    /// Shared slot holding the current node
    Object(RefObject),
}

impl NodeRef {
    /// Create a callback ref. The node arrives type-erased; downcast it to
    /// the backend's node type.
    pub fn callback(f: impl Fn(Option<&dyn Any>) + 'static) -> Self {
        NodeRef::Callback(Rc::new(f))
    }

    pub(crate) fn set<N: Clone + 'static>(&self, node: Option<&N>) {
        match self {
            NodeRef::Callback(f) => f(node.map(|n| n as &dyn Any)),
            NodeRef::Object(obj) => obj.set(node.cloned()),
        }
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NodeRef::Callback(a), NodeRef::Callback(b)) => Rc::ptr_eq(a, b),
            (NodeRef::Object(a), NodeRef::Object(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Callback(_) => write!(f, "NodeRef::Callback"),
            NodeRef::Object(obj) => write!(f, "NodeRef::Object(set: {})", obj.is_set()),
        }
    }
}

/// Object ref: a shared slot for a live node
#[derive(Clone, Default)]
pub struct RefObject(Rc<RefCell<Option<Rc<dyn Any>>>>);

impl RefObject {
    /// Create an empty ref
    pub fn new() -> Self {
        Self::default()
    }

    /// Current node, if set and of type `N`
    pub fn current<N: Clone + 'static>(&self) -> Option<N> {
        self.0.borrow().as_ref().and_then(|node| node.downcast_ref::<N>()).cloned()
    }

    /// Check if a node is held
    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }

    fn set<N: 'static>(&self, node: Option<N>) {
        *self.0.borrow_mut() = node.map(|n| Rc::new(n) as Rc<dyn Any>);
    }
}

impl From<RefObject> for NodeRef {
    fn from(obj: RefObject) -> Self {
        NodeRef::Object(obj)
    }
}

/// Create an object ref
pub fn create_ref() -> RefObject {
    RefObject::new()
}

/// A description of one node
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// What to render
    pub kind: ElementKind,
    /// Explicit identity key
    pub key: Option<Key>,
    /// Props
    pub props: Props,
    /// Child descriptions
    pub children: Vec<Element>,
    /// Node ref
    pub node_ref: Option<NodeRef>,
}

impl Element {
    fn with_kind(kind: ElementKind) -> Self {
        Self {
            kind,
            key: None,
            props: Props::new(),
            children: Vec::new(),
            node_ref: None,
        }
    }

    /// Create a host element
    pub fn host(tag: impl Into<String>) -> Self {
        Self::with_kind(ElementKind::Host(tag.into()))
    }

    /// Create a text element
    pub fn text(value: impl Into<Value>) -> Self {
        let value: Value = value.into();
        let mut element = Self::with_kind(ElementKind::Text);
        element.props.insert("nodeValue", value);
        element
    }

    /// Create a component element
    pub fn component(component: Component) -> Self {
        Self::with_kind(ElementKind::Component(component))
    }

    /// Set the key
    pub fn key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Set a prop
    pub fn prop(mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.props.insert(name, prop);
        self
    }

    /// Replace all props
    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Attach an event listener (`on("click", ..)` sets `onclick`)
    pub fn on(mut self, event: &str, f: impl Fn(&Event) + 'static) -> Self {
        self.props.insert(format!("on{event}"), Listener::new(f));
        self
    }

    /// Set one inline style entry
    pub fn style(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut style = match self.props.remove("style") {
            Some(Prop::Style(style)) => style,
            _ => Style::new(),
        };
        style.insert(key.into(), value.into());
        self.props.insert("style", style);
        self
    }

    /// Append a child
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append children
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Attach a node ref
    pub fn node_ref(mut self, node_ref: impl Into<NodeRef>) -> Self {
        self.node_ref = Some(node_ref.into());
        self
    }

    /// Identity the differ matches on
    pub fn identity(&self) -> Identity {
        Identity {
            key: self.key.clone(),
            ty: self.kind.type_tag(),
        }
    }
}

/// Plain strings and numbers become text children
impl From<&str> for Element {
    fn from(s: &str) -> Self {
        Element::text(s)
    }
}

impl From<String> for Element {
    fn from(s: String) -> Self {
        Element::text(s)
    }
}

impl From<i64> for Element {
    fn from(n: i64) -> Self {
        Element::text(n)
    }
}

impl From<Component> for Element {
    fn from(c: Component) -> Self {
        Element::component(c)
    }
}

/// Create a host element
pub fn h(tag: impl Into<String>) -> Element {
    Element::host(tag)
}

/// Create a text element
pub fn text(value: impl Into<Value>) -> Element {
    Element::text(value)
}

/// Group children without a wrapping node
pub fn fragment<I>(children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Element>,
{
    Element::component(FRAGMENT).children(children)
}
