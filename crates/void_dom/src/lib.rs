//! # void_dom - Live-Tree Adapter
//!
//! The narrow interface between the fiber reconciler and a live document:
//! - `Backend`: single-mutation primitives a document must provide
//! - `Adapter`: node creation, prop diffing (attributes, properties, inline
//!   styles, listeners) and placement on top of a backend
//! - `MemoryDocument`: headless backend with an operation log
//!
//! ## Prop rules
//!
//! ```text
//! children        ──► ignored
//! style (map)     ──► per-key style diff
//! on<Event>       ──► listener, name lower-cased
//! native property ──► assigned (non-SVG only)
//! anything else   ──► attribute, removed when null-like
//! ```

pub mod adapter;
pub mod backend;
pub mod memory;
pub mod props;
pub mod value;

pub use adapter::{Adapter, NodeKind};
pub use backend::Backend;
pub use memory::{DomOp, MemoryDocument, NodeId};
pub use props::{Event, Listener, Prop, Props, Style};
pub use value::Value;

/// Prelude
pub mod prelude {
    pub use crate::{
        Adapter, Backend, DomOp, Event, Listener, MemoryDocument, NodeId, NodeKind, Prop, Props,
        Style, Value,
    };
}
