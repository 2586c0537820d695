//! # void_fiber - Incremental Reconciler
//!
//! Keeps a live document in sync with declarative [`Element`] trees:
//! - `Tree`: generational fiber arena, root registry and update channel
//! - `WalkJob`: interruptible depth-first walk that expands components,
//!   resolves host nodes and diffs children
//! - `diff`: keyed list differ producing insert / update / move / remove
//! - commit: applies a finished subtree to the live tree, then runs layout
//!   callbacks and schedules effects
//! - `Renderer`: the tree plus its time-sliced scheduler
//! - `signal`: standalone reactive values with subscribed effects
//!
//! ## Architecture
//!
//! ```text
//! render / SetState ──► Updater ──► channel ──► Tree::update ──► WalkJob
//!                                                                   │
//!      ┌──────────── Scheduler slice (yield between fibers) ◄───────┘
//!      ▼
//!  capture ──► diff ──► link ──► ascend ──► commit (dirty fiber)
//!                                             │
//!                          layout callbacks ◄─┴─► EffectJob (next job)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use void_fiber::prelude::*;
//!
//! fn counter(scope: &mut Scope<'_>) -> Vec<Element> {
//!     let (count, set) = scope.use_state(0);
//!     vec![h("button").on("click", move |_| set.set(count + 1)).child(text(count))]
//! }
//!
//! let mut doc = MemoryDocument::new();
//! let container = doc.create_container("main");
//! let mut renderer = Renderer::new(doc);
//! renderer.render(Element::component(Component::new("Counter", counter)), &container);
//! renderer.run_until_idle();
//! ```

pub mod action;
pub mod arena;
mod commit;
pub mod config;
pub mod diff;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod reconcile;
pub mod renderer;
pub mod signal;

pub use action::{Action, OpFlags};
pub use arena::{FiberArena, FiberId};
pub use config::{ConfigError, RendererConfig};
pub use diff::{diff, DiffOp, Patch};
pub use element::{
    create_ref, fragment, h, text, Component, Element, ElementKind, Identity, Key, Memo, NodeRef,
    PropsEq, RefObject, RenderFn, TypeTag, FRAGMENT,
};
pub use error::{FiberError, FiberResult};
pub use fiber::{Fiber, FiberKind};
pub use hooks::{Cleanup, Dispatch, Hooks, Scope, SetState, Updater};
pub use reconcile::{EffectJob, RenderStats, Tree, WalkJob};
pub use renderer::Renderer;
pub use signal::{
    create_effect, create_effect_on, create_memo, create_memo_with, create_signal,
    create_signal_with, untrack, Equals, ReadSignal, WriteSignal,
};

/// Prelude
pub mod prelude {
    pub use crate::{
        create_ref, fragment, h, text, Cleanup, Component, Element, FiberError, FiberId,
        FiberResult, NodeRef, RefObject, Renderer, RendererConfig, Scope, SetState, Tree,
    };
    pub use crate::signal::{create_effect, create_memo, create_signal, ReadSignal, WriteSignal};
    pub use void_dom::prelude::*;
    pub use void_scheduler::{Deferral, ManualClock, SchedulerConfig};
}
