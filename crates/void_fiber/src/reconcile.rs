//! Reconciler: the interruptible depth-first walk
//!
//! A [`WalkJob`] is queued per dirty fiber. Each run captures fibers one at
//! a time and checks the slice deadline in between, keeping its cursor in
//! the job itself so the next slice resumes where this one stopped.
//!
//! ```text
//! capture(f) ── component? ── memo equal ──► get_sibling(f)
//!     │              └──────── render(scope) ──┐
//!     └── host: ensure node, take children ────┤
//!                                              ▼
//!                      diff(kids, descriptions) ──► link child/sibling chain
//!                                              │
//!            child? ──► capture(child)         └─ else get_sibling(f):
//!                                                  bubble, commit if dirty,
//!                                                  sibling or parent
//! ```

use crate::action::{Action, OpFlags};
use crate::arena::{FiberArena, FiberId};
use crate::diff::{diff, DiffOp};
use crate::element::{Element, Identity};
use crate::error::{FiberError, FiberResult};
use crate::fiber::{Fiber, FiberKind};
use crate::hooks::{Scope, Updater};
use crossbeam_channel::Receiver;
use std::collections::{HashMap, HashSet};
use std::mem;
use void_dom::{Adapter, Backend};
use void_scheduler::{Job, Slice, Spawn, Step};

/// Counters over the lifetime of a tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Walk jobs started on a dirty fiber
    pub walks: u64,
    /// Fibers captured
    pub captured: u64,
    /// Memoized components that skipped rendering
    pub memo_skips: u64,
    /// Children created by the differ
    pub inserts: u64,
    /// Children relocated by the differ
    pub moves: u64,
    /// Children updated in place
    pub updates: u64,
    /// Children removed by the differ
    pub removals: u64,
    /// Dirty fibers committed
    pub commits: u64,
}

/// Fiber tree plus the live-tree adapter it renders into
pub struct Tree<B: Backend> {
    pub(crate) fibers: FiberArena<B::Node>,
    pub(crate) adapter: Adapter<B>,
    roots: HashMap<B::Node, FiberId>,
    /// Roots given a new description after their walk already expanded them
    rerender: HashSet<FiberId>,
    updater: Updater,
    requests: Receiver<FiberId>,
    pub(crate) stats: RenderStats,
}

impl<B: Backend + 'static> Tree<B> {
    /// Create an empty tree over a backend
    pub fn new(backend: B) -> Self {
        let (tx, requests) = crossbeam_channel::unbounded();
        Self {
            fibers: FiberArena::new(),
            adapter: Adapter::new(backend),
            roots: HashMap::new(),
            rerender: HashSet::new(),
            updater: Updater::new(tx),
            requests,
            stats: RenderStats::default(),
        }
    }

    /// Get a fiber
    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<B::Node>> {
        self.fibers.get(id)
    }

    /// Number of live fibers
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Check if no fiber is alive
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Root fiber mounted on `container`
    pub fn root(&self, container: &B::Node) -> FiberResult<FiberId> {
        self.roots
            .get(container)
            .copied()
            .filter(|id| self.fibers.contains(*id))
            .ok_or(FiberError::UnknownRoot)
    }

    /// Get the adapter
    pub fn adapter(&self) -> &Adapter<B> {
        &self.adapter
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        self.adapter.backend()
    }

    /// Get the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        self.adapter.backend_mut()
    }

    /// Unwrap the backend
    pub fn into_backend(self) -> B {
        self.adapter.into_inner()
    }

    /// Update requester for this tree
    pub fn updater(&self) -> Updater {
        self.updater.clone()
    }

    /// Render statistics
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Children of `id` in render order (empty for unknown fibers)
    pub fn children_of(&self, id: FiberId) -> Vec<FiberId> {
        self.fibers.get(id).map(|f| f.kids.clone()).unwrap_or_default()
    }

    /// Mount or re-render `element` into `container`
    pub fn render<S: Spawn<Self>>(&mut self, element: Element, container: B::Node, spawner: &mut S) -> FiberId {
        let root = match self.root(&container) {
            Ok(id) => id,
            Err(_) => {
                let id = self.fibers.insert(Fiber::root(container.clone()));
                log::debug!("Mounted root {:?} on {:?}", id, container);
                self.roots.insert(container, id);
                id
            }
        };

        if let Some(fiber) = self.fibers.get_mut(root) {
            fiber.children = vec![element];
            // a walk in flight may have expanded the previous description
            if fiber.dirty {
                self.rerender.insert(root);
            }
        }
        self.mark_dirty(root, spawner);
        root
    }

    /// Mark a fiber dirty and queue a walk rooted at it.
    /// A fiber that is already dirty is left alone.
    pub fn update<S: Spawn<Self>>(&mut self, id: FiberId, spawner: &mut S) -> FiberResult<()> {
        if !self.fibers.contains(id) {
            return Err(FiberError::StaleFiber(id));
        }
        self.mark_dirty(id, spawner);
        Ok(())
    }

    fn mark_dirty<S: Spawn<Self>>(&mut self, id: FiberId, spawner: &mut S) {
        let Some(fiber) = self.fibers.get_mut(id) else {
            return;
        };
        if fiber.dirty {
            return;
        }
        fiber.dirty = true;
        spawner.spawn(Box::new(WalkJob::new(id)));
    }

    /// Turn queued update requests into walk jobs
    pub fn drain_requests<S: Spawn<Self>>(&mut self, spawner: &mut S) -> usize {
        let mut drained = 0;
        while let Ok(id) = self.requests.try_recv() {
            drained += 1;
            if let Err(err) = self.update(id, spawner) {
                log::warn!("Ignoring update request: {}", err);
            }
        }
        drained
    }

    /// Process one fiber and return the next one to visit
    fn capture(&mut self, id: FiberId, walk: &mut WalkJob, slice: &mut Slice<'_, Self>) -> Option<FiberId> {
        self.stats.captured += 1;

        let is_component = self.fibers.get(id)?.kind.is_component();
        if is_component {
            if self.is_memo_unchanged(id) {
                self.stats.memo_skips += 1;
                return self.get_sibling(id, walk, slice);
            }
            self.expand_component(id);
        } else {
            self.expand_host(id);
        }

        match self.fibers.get(id).and_then(|f| f.child) {
            Some(child) => Some(child),
            None => self.get_sibling(id, walk, slice),
        }
    }

    fn is_memo_unchanged(&self, id: FiberId) -> bool {
        let Some(fiber) = self.fibers.get(id) else {
            return false;
        };
        match (&fiber.kind, &fiber.old_props) {
            (FiberKind::Component(c), Some(old)) if !fiber.dirty => {
                c.is_unchanged(old, &fiber.props, &fiber.children)
            }
            _ => false,
        }
    }

    fn expand_component(&mut self, id: FiberId) {
        let Some(fiber) = self.fibers.get_mut(id) else {
            return;
        };
        let FiberKind::Component(component) = fiber.kind else {
            return;
        };

        let props = mem::take(&mut fiber.props);
        let children = mem::take(&mut fiber.children);
        let mut hooks = mem::take(&mut fiber.hooks);

        let output = {
            let mut scope = Scope::new(id, &props, &children, &mut hooks, &self.updater);
            component.render(&mut scope)
        };
        log::trace!("Rendered {} {:?} into {} children", component.name(), id, output.len());

        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.props = props;
            fiber.children = children;
            fiber.hooks = hooks;
        }
        self.reconcile_children(id, output);
    }

    fn expand_host(&mut self, id: FiberId) {
        let adapter = &mut self.adapter;
        let Some(fiber) = self.fibers.get_mut(id) else {
            return;
        };

        if fiber.node.is_none() {
            if matches!(&fiber.kind, FiberKind::Host(tag) if tag == "svg") {
                fiber.svg = true;
            }
            fiber.node = adapter.create_node(fiber.kind.node_kind(), &fiber.props, fiber.svg);
        }

        let children = fiber.children.clone();
        self.reconcile_children(id, children);
    }

    /// Diff the previous kids of `parent` against `children` and relink
    fn reconcile_children(&mut self, parent: FiberId, children: Vec<Element>) {
        let Some(fiber) = self.fibers.get_mut(parent) else {
            return;
        };
        let old_kids = mem::take(&mut fiber.kids);
        let svg = fiber.svg;

        let old_kids: Vec<FiberId> = old_kids.into_iter().filter(|&kid| self.fibers.contains(kid)).collect();
        let old_keys: Vec<Identity> = old_kids
            .iter()
            .filter_map(|&kid| self.fibers.get(kid).map(Fiber::identity))
            .collect();
        let new_keys: Vec<Identity> = children.iter().map(Element::identity).collect();
        let patch = diff(&old_keys, &new_keys);

        let mut deletions = Vec::with_capacity(patch.removed.len());
        for &index in &patch.removed {
            let kid = old_kids[index];
            if let Some(old) = self.fibers.get_mut(kid) {
                old.action = Some(Action::new(OpFlags::REMOVE, None));
                old.sibling = None;
                deletions.push(kid);
            }
        }
        self.stats.removals += deletions.len() as u64;

        let mut kids = Vec::with_capacity(children.len());
        for (element, op) in children.into_iter().zip(patch.ops) {
            let (kid, action, reused) = match op {
                DiffOp::Update { old } => {
                    self.stats.updates += 1;
                    (old_kids[old], Action::update(), Some(element))
                }
                DiffOp::Move { old, before } => {
                    self.stats.moves += 1;
                    let anchor = before.map(|b| old_kids[b]);
                    (old_kids[old], Action::new(OpFlags::MOVE | OpFlags::UPDATE, anchor), Some(element))
                }
                DiffOp::Insert { before } => {
                    self.stats.inserts += 1;
                    let anchor = before.map(|b| old_kids[b]);
                    let kid = self.fibers.insert(Fiber::from_element(element));
                    (kid, Action::new(OpFlags::INSERT, anchor), None)
                }
            };

            let Some(child) = self.fibers.get_mut(kid) else {
                continue;
            };
            if let Some(element) = reused {
                child.reuse(element);
            }
            child.action = Some(action);
            child.parent = Some(parent);
            child.sibling = None;
            if svg {
                child.svg = true;
            }
            kids.push(kid);
        }

        for pair in kids.windows(2) {
            if let Some(prev) = self.fibers.get_mut(pair[0]) {
                prev.sibling = Some(pair[1]);
            }
        }

        if let Some(fiber) = self.fibers.get_mut(parent) {
            fiber.child = kids.first().copied();
            fiber.kids = kids;
            fiber.deletions.extend(deletions);
        }
    }

    /// Ascend from `id` until a sibling to visit is found.
    /// Dirty fibers met on the way are committed; the walk ends at its root.
    fn get_sibling(&mut self, id: FiberId, walk: &mut WalkJob, slice: &mut Slice<'_, Self>) -> Option<FiberId> {
        let mut current = id;
        loop {
            self.bubble(current, walk);

            let fiber = self.fibers.get_mut(current)?;
            if fiber.dirty {
                fiber.dirty = false;
                // a dirty descendant that still has to be placed is committed
                // together with the enclosing subtree so sibling order holds
                let deferred = current != walk.root && fiber.action.is_some_and(|a| a.is_placement());
                if !deferred {
                    self.commit(current);
                    self.finish_commit(current, walk, slice);
                }
            }

            if current == walk.root {
                if self.rerender.remove(&current) {
                    log::debug!("Root {:?} was re-rendered during its walk", current);
                    self.mark_dirty(current, slice);
                }
                return None;
            }

            let fiber = self.fibers.get(current)?;
            match (fiber.sibling, fiber.parent) {
                (Some(sibling), _) => return Some(sibling),
                (None, Some(parent)) => current = parent,
                (None, None) => return None,
            }
        }
    }

    /// Remember components with queued lifecycle callbacks
    fn bubble(&mut self, id: FiberId, walk: &mut WalkJob) {
        if let Some(fiber) = self.fibers.get(id) {
            if fiber.kind.is_component() && (fiber.hooks.has_layout() || fiber.hooks.has_effects()) {
                walk.lifecycle.push(id);
            }
        }
    }

    /// Run layout callbacks of the committed subtree now and schedule its effects
    fn finish_commit(&mut self, root: FiberId, walk: &mut WalkJob, slice: &mut Slice<'_, Self>) {
        let (inside, outside): (Vec<_>, Vec<_>) = walk
            .lifecycle
            .drain(..)
            .partition(|&id| self.is_within(id, root));
        walk.lifecycle = outside;

        let mut with_effects = Vec::new();
        for id in inside {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.hooks.run_layout();
                if fiber.hooks.has_effects() {
                    with_effects.push(id);
                }
            }
        }

        if !with_effects.is_empty() {
            slice.schedule(Box::new(EffectJob { fibers: with_effects }));
        }
    }

    /// Check if `id` is `root` or one of its descendants
    pub(crate) fn is_within(&self, id: FiberId, root: FiberId) -> bool {
        let mut current = Some(id);
        while let Some(fid) = current {
            if fid == root {
                return true;
            }
            current = self.fibers.get(fid).and_then(|f| f.parent);
        }
        false
    }
}

/// Resumable walk over the subtree of one dirty fiber
pub struct WalkJob {
    root: FiberId,
    next: Option<FiberId>,
    started: bool,
    lifecycle: Vec<FiberId>,
}

impl WalkJob {
    /// Create a new walk rooted at `root`
    pub fn new(root: FiberId) -> Self {
        Self {
            root,
            next: None,
            started: false,
            lifecycle: Vec::new(),
        }
    }
}

impl<B: Backend + 'static> Job<Tree<B>> for WalkJob {
    fn name(&self) -> &str {
        "walk"
    }

    fn run(&mut self, tree: &mut Tree<B>, slice: &mut Slice<'_, Tree<B>>) -> Step {
        if !self.started {
            self.started = true;
            match tree.fibers.get(self.root) {
                Some(fiber) if fiber.dirty => {
                    log::debug!("Walk started at {} {:?}", fiber.kind.name(), self.root);
                    tree.stats.walks += 1;
                    tree.rerender.remove(&self.root);
                    self.next = Some(self.root);
                }
                _ => return Step::Done,
            }
        }

        loop {
            let Some(id) = self.next.take() else {
                return Step::Done;
            };
            self.next = tree.capture(id, self, slice);
            tree.drain_requests(slice);

            if self.next.is_none() {
                return Step::Done;
            }
            if slice.should_yield() {
                return Step::Pending;
            }
        }
    }
}

/// Runs queued effects of the components of one commit
pub struct EffectJob {
    fibers: Vec<FiberId>,
}

impl<B: Backend + 'static> Job<Tree<B>> for EffectJob {
    fn name(&self) -> &str {
        "effects"
    }

    fn run(&mut self, tree: &mut Tree<B>, slice: &mut Slice<'_, Tree<B>>) -> Step {
        for id in self.fibers.drain(..) {
            if let Some(fiber) = tree.fibers.get_mut(id) {
                fiber.hooks.run_effects();
            }
        }
        tree.drain_requests(slice);
        Step::Done
    }
}
