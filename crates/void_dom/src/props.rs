//! Element props: values, inline styles and event listeners

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Event delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Lower-case event name ("click", "input", ...)
    pub kind: String,
    /// Event payload
    pub detail: Value,
}

impl Event {
    /// Create a new event
    pub fn new(kind: impl Into<String>, detail: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            detail: detail.into(),
        }
    }
}

/// Shared event listener. Two listeners are equal only if they are the same
/// allocation, which is what attaching/detaching on a node relies on.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    /// Wrap a closure
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the listener
    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Inline style map, diffed per key
pub type Style = BTreeMap<String, Value>;

/// A single prop
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    /// Attribute or property value
    Value(Value),
    /// Inline style object
    Style(Style),
    /// Event listener (names starting with `on`)
    Listener(Listener),
}

impl Prop {
    /// Value form, if this prop is a plain value
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Prop::Value(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_value_prop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Prop {
                fn from(v: $ty) -> Self {
                    Prop::Value(v.into())
                }
            }
        )*
    };
}

impl_value_prop!(Value, bool, i32, i64, usize, f64, String, &str);

impl From<Listener> for Prop {
    fn from(l: Listener) -> Self {
        Prop::Listener(l)
    }
}

impl From<Style> for Prop {
    fn from(s: Style) -> Self {
        Prop::Style(s)
    }
}

/// Ordered prop map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: BTreeMap<String, Prop>,
}

impl Props {
    /// Create empty props
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.insert(name, prop);
        self
    }

    /// Insert or replace a prop
    pub fn insert(&mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Option<Prop> {
        self.entries.insert(name.into(), prop.into())
    }

    /// Remove a prop
    pub fn remove(&mut self, name: &str) -> Option<Prop> {
        self.entries.remove(name)
    }

    /// Get a prop
    pub fn get(&self, name: &str) -> Option<&Prop> {
        self.entries.get(name)
    }

    /// Get a plain value prop
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Prop::as_value)
    }

    /// Get a listener prop
    pub fn listener(&self, name: &str) -> Option<&Listener> {
        match self.get(name)? {
            Prop::Listener(l) => Some(l),
            _ => None,
        }
    }

    /// Check if a prop is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Prop)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of props
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shallow comparison: a key only present on one side, or a value that
    /// differs (listeners by identity), counts as a change.
    pub fn shallow_eq(&self, other: &Props) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.entries.get(k).is_some_and(|o| o == v))
    }
}

impl<K: Into<String>, P: Into<Prop>> FromIterator<(K, P)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, P)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, p)| (k.into(), p.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shallow_eq() {
        let click = Listener::new(|_| {});
        let a = Props::new().with("id", "x").with("onClick", click.clone());
        let b = Props::new().with("id", "x").with("onClick", click);
        assert!(a.shallow_eq(&b));

        let c = b.clone().with("title", "t");
        assert!(!a.shallow_eq(&c));
        assert!(!c.shallow_eq(&a));

        let d = Props::new().with("id", "x").with("onClick", Listener::new(|_| {}));
        assert!(!a.shallow_eq(&d));
    }
}
