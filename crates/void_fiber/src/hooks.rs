//! Hook slots and the render scope
//!
//! Every component fiber owns a [`Hooks`] list. During expansion the
//! component receives a [`Scope`] whose cursor starts at zero, so the n-th
//! hook call of a render always lands on the n-th slot.
//!
//! ```text
//! render #1: use_state ─► slot 0   use_effect ─► slot 1 ─► effect queue
//! render #2: use_state ─► slot 0   use_effect ─► slot 1 (deps equal, not queued)
//! ```

use crate::arena::FiberId;
use crate::element::Element;
use crossbeam_channel::Sender;
use std::any::Any;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;
use void_dom::{Props, Value};

/// Teardown returned by an effect, run before the next run and on unmount
pub type Cleanup = Box<dyn FnOnce()>;

type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

/// Sends update requests for fibers to the renderer
#[derive(Clone)]
pub struct Updater {
    tx: Sender<FiberId>,
}

impl Updater {
    pub(crate) fn new(tx: Sender<FiberId>) -> Self {
        Self { tx }
    }

    /// Ask the renderer to re-render `fiber`
    pub fn request_update(&self, fiber: FiberId) {
        if self.tx.send(fiber).is_err() {
            log::debug!("Update for {:?} dropped: renderer is gone", fiber);
        }
    }
}

#[derive(Default)]
struct HookSlot {
    state: Option<Rc<dyn Any>>,
    deps: Option<Vec<Value>>,
    effect: Option<Effect>,
    cleanup: Option<Cleanup>,
}

/// Hook storage of one component fiber
#[derive(Default)]
pub struct Hooks {
    slots: Vec<HookSlot>,
    layout: Vec<usize>,
    effects: Vec<usize>,
}

impl Hooks {
    /// Number of hook slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the component used no hooks
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current value of a `use_state` / `use_reducer` slot
    pub fn state<T: Clone + 'static>(&self, index: usize) -> Option<T> {
        let state = self.slots.get(index)?.state.as_ref()?;
        state.downcast_ref::<RefCell<T>>().map(|cell| cell.borrow().clone())
    }

    /// Check if layout callbacks are queued
    pub fn has_layout(&self) -> bool {
        !self.layout.is_empty()
    }

    /// Check if effects are queued
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    pub(crate) fn run_layout(&mut self) {
        let queue = mem::take(&mut self.layout);
        Self::run_queue(&mut self.slots, &queue);
    }

    pub(crate) fn run_effects(&mut self) {
        let queue = mem::take(&mut self.effects);
        Self::run_queue(&mut self.slots, &queue);
    }

    /// All cleanups of a queue run before any of its callbacks
    fn run_queue(slots: &mut [HookSlot], queue: &[usize]) {
        for &index in queue {
            if let Some(cleanup) = slots.get_mut(index).and_then(|s| s.cleanup.take()) {
                cleanup();
            }
        }
        for &index in queue {
            if let Some(slot) = slots.get_mut(index) {
                if let Some(effect) = slot.effect.take() {
                    slot.cleanup = effect();
                }
            }
        }
    }

    /// Run every outstanding cleanup and drop queued callbacks
    pub(crate) fn unmount(&mut self) {
        self.layout.clear();
        self.effects.clear();
        for slot in &mut self.slots {
            slot.effect = None;
            if let Some(cleanup) = slot.cleanup.take() {
                cleanup();
            }
        }
    }
}

fn deps_changed(prev: Option<&[Value]>, next: Option<&[Value]>) -> bool {
    match (prev, next) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

/// State setter returned by [`Scope::use_state`]
pub struct SetState<T> {
    cell: Rc<RefCell<T>>,
    fiber: FiberId,
    updater: Updater,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            fiber: self.fiber,
            updater: self.updater.clone(),
        }
    }
}

impl<T> SetState<T> {
    /// Store a new value and schedule a re-render
    pub fn set(&self, value: T) {
        *self.cell.borrow_mut() = value;
        self.updater.request_update(self.fiber);
    }

    /// Derive the next value from the current one
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.cell.borrow());
        self.set(next);
    }

    /// Read the current value
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }
}

/// Action dispatcher returned by [`Scope::use_reducer`]
pub struct Dispatch<S, A> {
    cell: Rc<RefCell<S>>,
    reducer: fn(&S, A) -> S,
    fiber: FiberId,
    updater: Updater,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            reducer: self.reducer,
            fiber: self.fiber,
            updater: self.updater.clone(),
        }
    }
}

impl<S, A> Dispatch<S, A> {
    /// Reduce the state with `action` and schedule a re-render
    pub fn dispatch(&self, action: A) {
        let next = (self.reducer)(&self.cell.borrow(), action);
        *self.cell.borrow_mut() = next;
        self.updater.request_update(self.fiber);
    }
}

/// Render context handed to a component
pub struct Scope<'a> {
    fiber: FiberId,
    props: &'a Props,
    children: &'a [Element],
    hooks: &'a mut Hooks,
    updater: &'a Updater,
    cursor: usize,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        fiber: FiberId,
        props: &'a Props,
        children: &'a [Element],
        hooks: &'a mut Hooks,
        updater: &'a Updater,
    ) -> Self {
        Self {
            fiber,
            props,
            children,
            hooks,
            updater,
            cursor: 0,
        }
    }

    /// Props of this render
    pub fn props(&self) -> &Props {
        self.props
    }

    /// Plain value prop
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.value(name)
    }

    /// Children passed to the component
    pub fn children(&self) -> &[Element] {
        self.children
    }

    /// Fiber being rendered
    pub fn current_fiber(&self) -> FiberId {
        self.fiber
    }

    /// Update requester, for callbacks that outlive the render
    pub fn updater(&self) -> Updater {
        self.updater.clone()
    }

    /// Schedule a re-render of this component
    pub fn request_update(&self) {
        self.updater.request_update(self.fiber);
    }

    fn next_slot(&mut self) -> (usize, &mut HookSlot) {
        let index = self.cursor;
        self.cursor += 1;
        if self.hooks.slots.len() <= index {
            self.hooks.slots.resize_with(index + 1, HookSlot::default);
        }
        (index, &mut self.hooks.slots[index])
    }

    fn state_cell<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let fiber = self.fiber;
        let (index, slot) = self.next_slot();

        if let Some(state) = slot.state.clone() {
            match state.downcast::<RefCell<T>>() {
                Ok(cell) => return cell,
                Err(_) => log::warn!("Hook {} of {:?} changed type between renders, resetting", index, fiber),
            }
        }

        let cell = Rc::new(RefCell::new(init()));
        slot.state = Some(cell.clone() as Rc<dyn Any>);
        cell
    }

    /// Local state, kept across renders
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        let cell = self.state_cell(|| initial);
        let value = cell.borrow().clone();
        let setter = SetState {
            cell,
            fiber: self.fiber,
            updater: self.updater.clone(),
        };
        (value, setter)
    }

    /// State driven by a reducer
    pub fn use_reducer<S: Clone + 'static, A>(&mut self, reducer: fn(&S, A) -> S, initial: S) -> (S, Dispatch<S, A>) {
        let cell = self.state_cell(|| initial);
        let value = cell.borrow().clone();
        let dispatch = Dispatch {
            cell,
            reducer,
            fiber: self.fiber,
            updater: self.updater.clone(),
        };
        (value, dispatch)
    }

    /// Run `effect` in a scheduled job after commit when `deps` changed.
    /// `None` deps run it after every render.
    pub fn use_effect(&mut self, deps: Option<Vec<Value>>, effect: impl FnOnce() -> Option<Cleanup> + 'static) {
        if let Some(index) = self.queue_side_effect(deps, Box::new(effect)) {
            if !self.hooks.effects.contains(&index) {
                self.hooks.effects.push(index);
            }
        }
    }

    /// Like [`use_effect`](Self::use_effect), but runs synchronously right
    /// after the commit that contains this component
    pub fn use_layout(&mut self, deps: Option<Vec<Value>>, effect: impl FnOnce() -> Option<Cleanup> + 'static) {
        if let Some(index) = self.queue_side_effect(deps, Box::new(effect)) {
            if !self.hooks.layout.contains(&index) {
                self.hooks.layout.push(index);
            }
        }
    }

    fn queue_side_effect(&mut self, deps: Option<Vec<Value>>, effect: Effect) -> Option<usize> {
        let (index, slot) = self.next_slot();
        if !deps_changed(slot.deps.as_deref(), deps.as_deref()) {
            return None;
        }
        slot.effect = Some(effect);
        slot.deps = deps;
        Some(index)
    }

    /// Cache a computed value until `deps` change
    pub fn use_memo<T: Clone + 'static>(&mut self, deps: Vec<Value>, compute: impl FnOnce() -> T) -> T {
        let (_, slot) = self.next_slot();
        let cached = slot.state.as_ref().and_then(|s| s.downcast_ref::<T>()).cloned();

        match cached {
            Some(value) if !deps_changed(slot.deps.as_deref(), Some(deps.as_slice())) => value,
            _ => {
                let value = compute();
                slot.state = Some(Rc::new(value.clone()) as Rc<dyn Any>);
                slot.deps = Some(deps);
                value
            }
        }
    }

    /// Keep the same callback instance until `deps` change
    pub fn use_callback<F: 'static>(&mut self, deps: Vec<Value>, callback: F) -> Rc<F> {
        self.use_memo(deps, || Rc::new(callback))
    }

    /// Mutable box that lives as long as the component
    pub fn use_ref<T: 'static>(&mut self, initial: T) -> Rc<RefCell<T>> {
        self.use_memo(Vec::new(), || Rc::new(RefCell::new(initial)))
    }
}
