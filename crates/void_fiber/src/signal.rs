//! Signals: fine-grained reactive values outside the fiber tree
//!
//! Reading a signal inside a running effect subscribes that effect. Writing
//! a signal re-runs its subscribers when the equality policy says the value
//! changed.
//!
//! ```text
//! create_effect(f) ──► push f ──► f() reads signal ──► subscribe(f)
//!                                                          │
//! write.set(v) ── equals(prev, v)? ── no ──► store v ──► run subscribers
//! ```
//!
//! Signals are single-threaded and live as long as something holds them.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Decides whether a write counts as a change
pub enum Equals<T> {
    /// Notify when the value differs by `PartialEq`
    Default,
    /// Never notify
    Always,
    /// Notify on every write
    Never,
    /// Notify unless `eq(prev, next)` holds
    With(fn(&T, &T) -> bool),
}

impl<T> Equals<T> {
    fn unchanged(&self, prev: &T, next: &T) -> bool
    where
        T: PartialEq,
    {
        match self {
            Equals::Default => prev == next,
            Equals::Always => true,
            Equals::Never => false,
            Equals::With(eq) => eq(prev, next),
        }
    }
}

impl<T> Default for Equals<T> {
    fn default() -> Self {
        Equals::Default
    }
}

impl<T> From<bool> for Equals<T> {
    fn from(equals: bool) -> Self {
        if equals {
            Equals::Always
        } else {
            Equals::Never
        }
    }
}

impl<T> fmt::Debug for Equals<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Equals::Default => f.write_str("Default"),
            Equals::Always => f.write_str("Always"),
            Equals::Never => f.write_str("Never"),
            Equals::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Effect registered with the signals it read
struct Computation {
    id: u64,
    run: Box<dyn Fn()>,
}

thread_local! {
    static RUNNING: RefCell<Vec<Option<Rc<Computation>>>> = const { RefCell::new(Vec::new()) };
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Pops the running computation even if it panicked
struct RunningGuard;

impl RunningGuard {
    fn push(computation: Option<Rc<Computation>>) -> Self {
        RUNNING.with(|stack| stack.borrow_mut().push(computation));
        RunningGuard
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        RUNNING.with(|stack| stack.borrow_mut().pop());
    }
}

impl Computation {
    fn execute(self: &Rc<Self>) {
        let _guard = RunningGuard::push(Some(self.clone()));
        (self.run)();
    }
}

fn running() -> Option<Rc<Computation>> {
    RUNNING.with(|stack| stack.borrow().last().cloned().flatten())
}

struct SignalState<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Rc<Computation>>>,
    equals: Equals<T>,
}

impl<T: Clone + PartialEq> SignalState<T> {
    fn track(&self) {
        if let Some(computation) = running() {
            let mut subscribers = self.subscribers.borrow_mut();
            if !subscribers.iter().any(|s| s.id == computation.id) {
                subscribers.push(computation);
            }
        }
    }

    fn write(&self, next: T) {
        if self.equals.unchanged(&self.value.borrow(), &next) {
            return;
        }
        *self.value.borrow_mut() = next;

        let subscribers = self.subscribers.borrow().clone();
        log::trace!("Signal changed, notifying {} subscribers", subscribers.len());
        for subscriber in subscribers {
            subscriber.execute();
        }
    }
}

/// Read half of a signal
pub struct ReadSignal<T> {
    state: Rc<SignalState<T>>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + PartialEq> ReadSignal<T> {
    /// Current value; subscribes the running effect
    pub fn get(&self) -> T {
        self.state.track();
        self.state.value.borrow().clone()
    }

    /// Current value without subscribing
    pub fn get_untracked(&self) -> T {
        self.state.value.borrow().clone()
    }

    /// Number of subscribed effects
    pub fn subscriber_count(&self) -> usize {
        self.state.subscribers.borrow().len()
    }
}

/// Write half of a signal
pub struct WriteSignal<T> {
    state: Rc<SignalState<T>>,
}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone + PartialEq> WriteSignal<T> {
    /// Store a value and notify subscribers if it counts as a change
    pub fn set(&self, value: T) {
        self.state.write(value);
    }

    /// Compute the next value from the current one
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.state.value.borrow());
        self.state.write(next);
    }
}

/// Create a signal compared with `PartialEq`
pub fn create_signal<T: Clone + PartialEq + 'static>(value: T) -> (ReadSignal<T>, WriteSignal<T>) {
    create_signal_with(value, Equals::Default)
}

/// Create a signal with an explicit equality policy
pub fn create_signal_with<T: Clone + PartialEq + 'static>(
    value: T,
    equals: impl Into<Equals<T>>,
) -> (ReadSignal<T>, WriteSignal<T>) {
    let state = Rc::new(SignalState {
        value: RefCell::new(value),
        subscribers: RefCell::new(Vec::new()),
        equals: equals.into(),
    });
    (
        ReadSignal {
            state: state.clone(),
        },
        WriteSignal { state },
    )
}

/// Run `effect` now and again whenever a signal it read changes
pub fn create_effect(effect: impl Fn() + 'static) {
    let id = NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    Rc::new(Computation {
        id,
        run: Box::new(effect),
    })
    .execute();
}

/// Like [`create_effect`], but also subscribed to whatever `source` reads
pub fn create_effect_on<D>(source: impl Fn() -> D + 'static, effect: impl Fn() + 'static) {
    create_effect(move || {
        source();
        effect();
    });
}

/// Derived signal recomputed when its inputs change
pub fn create_memo<T: Clone + PartialEq + 'static>(compute: impl Fn() -> T + 'static) -> ReadSignal<T> {
    create_memo_with(compute, Equals::Default)
}

/// Derived signal with an explicit equality policy
pub fn create_memo_with<T: Clone + PartialEq + 'static>(
    compute: impl Fn() -> T + 'static,
    equals: impl Into<Equals<T>>,
) -> ReadSignal<T> {
    let (read, write) = create_signal_with(untrack(&compute), equals);
    create_effect(move || write.set(compute()));
    read
}

/// Run `f` without subscribing the running effect to what it reads
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _guard = RunningGuard::push(None);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_get_set() {
        let (count, set_count) = create_signal(1);
        assert_eq!(count.get(), 1);
        set_count.set(2);
        assert_eq!(count.get(), 2);
        set_count.update(|n| n * 10);
        assert_eq!(count.get(), 20);
    }

    #[test]
    fn test_effect_tracks_reads() {
        let (name, set_name) = create_signal("a".to_string());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        let read = name.clone();
        create_effect(move || log.borrow_mut().push(read.get()));
        assert_eq!(name.subscriber_count(), 1);

        set_name.set("b".into());
        // same value: no rerun
        set_name.set("b".into());
        assert_eq!(*seen.borrow(), vec!["a", "b"]);
        // rerunning does not subscribe twice
        assert_eq!(name.subscriber_count(), 1);
    }

    #[test]
    fn test_memo_follows_source() {
        let (name, set_name) = create_signal("a".to_string());
        let full = {
            let name = name.clone();
            create_memo(move || format!("c-{}", name.get()))
        };
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        let (n, f) = (name.clone(), full.clone());
        create_effect(move || log.borrow_mut().push(format!("{} {}", n.get(), f.get())));

        set_name.set("b".into());
        assert_eq!(name.get(), "b");
        assert_eq!(full.get(), "c-b");
        assert_eq!(seen.borrow().last().map(String::as_str), Some("b c-b"));
    }

    #[test]
    fn test_equals_policies() {
        let runs = Rc::new(Cell::new(0));

        let (never, set_never) = create_signal_with(1, false);
        let counter = runs.clone();
        create_effect(move || {
            never.get();
            counter.set(counter.get() + 1);
        });
        set_never.set(1);
        assert_eq!(runs.get(), 2);

        let (always, set_always) = create_signal_with(1, true);
        set_always.set(5);
        assert_eq!(always.get(), 1);

        let (parity, set_parity) = create_signal_with(2, Equals::With(|a: &i32, b: &i32| a % 2 == b % 2));
        set_parity.set(4);
        assert_eq!(parity.get(), 2);
        set_parity.set(3);
        assert_eq!(parity.get(), 3);
    }

    #[test]
    fn test_effect_on_explicit_source() {
        let (source, set_source) = create_signal(0);
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        create_effect_on(move || source.get(), move || counter.set(counter.get() + 1));
        set_source.set(1);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_untrack_skips_subscription() {
        let (value, set_value) = create_signal(0);
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let read = value.clone();
        create_effect(move || {
            untrack(|| read.get());
            counter.set(counter.get() + 1);
        });
        set_value.set(1);
        assert_eq!(runs.get(), 1);
        assert_eq!(value.subscriber_count(), 0);
    }
}
