//! Committer: apply a walked subtree to the live tree
//!
//! Fibers are visited in pre-order with an explicit stack, so a parent's
//! deletions and placement happen before anything below it.
//!
//! ```text
//! component  INSERT|MOVE ──► forwarded (with anchor) to every child
//!            UPDATE      ──► forwarded to children that carry an action
//! host       INSERT|MOVE ──► insert_before(parent node, node, anchor node)
//!            UPDATE      ──► update_node(node, old props, props)
//! ```

use crate::action::{Action, OpFlags};
use crate::arena::FiberId;
use crate::fiber::Fiber;
use crate::reconcile::Tree;
use std::mem;
use void_dom::Backend;

impl<B: Backend + 'static> Tree<B> {
    /// Commit the subtree rooted at `root`
    pub(crate) fn commit(&mut self, root: FiberId) {
        self.stats.commits += 1;
        if let Some(fiber) = self.fibers.get(root) {
            log::debug!("Committing {} {:?}", fiber.kind.name(), root);
        }

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.apply_deletions(id);
            self.commit_fiber(id);

            let Some(fiber) = self.fibers.get(id) else {
                continue;
            };
            if id != root {
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
            if let Some(child) = fiber.child {
                stack.push(child);
            }
        }
    }

    fn commit_fiber(&mut self, id: FiberId) {
        let Some(fiber) = self.fibers.get_mut(id) else {
            return;
        };

        if let Some(action) = fiber.action.take() {
            if fiber.kind.is_component() {
                self.forward(id, action);
            } else {
                if action.is_placement() {
                    self.place(id, action.anchor);
                }
                if action.op.contains(OpFlags::UPDATE) {
                    self.update_host(id);
                }
            }
        }

        self.refer(id);
    }

    /// Push a component's action down to its children
    fn forward(&mut self, id: FiberId, action: Action) {
        let placement = action.op & OpFlags::PLACEMENT;
        let update = action.op.contains(OpFlags::UPDATE);

        let mut next = self.fibers.get(id).and_then(|f| f.child);
        while let Some(kid) = next {
            let Some(child) = self.fibers.get_mut(kid) else {
                break;
            };

            if !placement.is_empty() {
                let forwarded = Action::new(placement, action.anchor);
                match &mut child.action {
                    Some(own) => own.merge(forwarded),
                    None => child.action = Some(forwarded),
                }
            }
            if update {
                if let Some(own) = &mut child.action {
                    own.op |= OpFlags::UPDATE;
                }
            }

            next = child.sibling;
        }
    }

    fn place(&mut self, id: FiberId, anchor: Option<FiberId>) {
        let Some(node) = self.fibers.get(id).and_then(|f| f.node.clone()) else {
            log::debug!("No live node to place for {:?}", id);
            return;
        };
        let Some(parent) = self.host_parent(id) else {
            log::debug!("No host parent for {:?}", id);
            return;
        };
        let anchor = self.anchor_node(id, anchor);
        self.adapter.insert_before(&parent, &node, anchor.as_ref());
    }

    fn update_host(&mut self, id: FiberId) {
        let Some(fiber) = self.fibers.get_mut(id) else {
            return;
        };
        // fresh nodes were created with their current props
        let Some(old) = fiber.old_props.take() else {
            return;
        };
        match &fiber.node {
            Some(node) => self.adapter.update_node(node, &old, &fiber.props),
            None => log::debug!("No live node to update for {:?}", id),
        }
    }

    fn refer(&self, id: FiberId) {
        if let Some(fiber) = self.fibers.get(id) {
            if let Some(node_ref) = &fiber.node_ref {
                node_ref.set(fiber.node.as_ref());
            }
        }
    }

    /// Nearest ancestor that owns a live node
    fn host_parent(&self, id: FiberId) -> Option<B::Node> {
        let mut current = self.fibers.get(id)?.parent;
        while let Some(pid) = current {
            let parent = self.fibers.get(pid)?;
            if !parent.kind.is_component() {
                return parent.node.clone();
            }
            current = parent.parent;
        }
        None
    }

    /// Live node that `id` goes in front of.
    ///
    /// Looks at the anchor and its following siblings first. Past the end of
    /// a component's children the search continues after the component, so
    /// appending inside a component never lands behind its parent's later
    /// children.
    fn anchor_node(&self, id: FiberId, anchor: Option<FiberId>) -> Option<B::Node> {
        if let Some(node) = anchor.and_then(|a| self.node_at_or_after(a)) {
            return Some(node);
        }

        let mut current = self.fibers.get(id)?.parent;
        while let Some(pid) = current {
            let parent = self.fibers.get(pid)?;
            if !parent.kind.is_component() {
                return None;
            }
            if let Some(node) = parent.sibling.and_then(|s| self.node_at_or_after(s)) {
                return Some(node);
            }
            current = parent.parent;
        }
        None
    }

    fn node_at_or_after(&self, start: FiberId) -> Option<B::Node> {
        let mut current = Some(start);
        while let Some(id) = current {
            if let Some(node) = self.first_host_node(id) {
                return Some(node);
            }
            current = self.fibers.get(id).and_then(|f| f.sibling);
        }
        None
    }

    fn first_host_node(&self, id: FiberId) -> Option<B::Node> {
        let fiber = self.fibers.get(id)?;
        if fiber.action.is_some_and(|a| a.is_placement()) {
            return None;
        }
        if !fiber.kind.is_component() {
            return fiber.node.clone();
        }

        let mut child = fiber.child;
        while let Some(kid) = child {
            if let Some(node) = self.first_host_node(kid) {
                return Some(node);
            }
            child = self.fibers.get(kid).and_then(|f| f.sibling);
        }
        None
    }

    fn apply_deletions(&mut self, id: FiberId) {
        let deletions = match self.fibers.get_mut(id) {
            Some(fiber) if !fiber.deletions.is_empty() => mem::take(&mut fiber.deletions),
            _ => return,
        };

        let before = self.fibers.len();
        for deleted in deletions {
            self.remove_fiber(deleted, true);
        }
        log::debug!("Removed {} fibers under {:?}", before - self.fibers.len(), id);
    }

    /// Free a fiber and everything below it. Only the topmost live nodes
    /// are detached; nested nodes leave with their ancestor.
    fn remove_fiber(&mut self, id: FiberId, detach: bool) {
        let Some(fiber) = self.fibers.remove(id) else {
            return;
        };
        let Fiber {
            mut hooks,
            node,
            node_ref,
            kids,
            deletions,
            ..
        } = fiber;

        hooks.unmount();

        let mut detach_kids = detach;
        if let Some(node) = &node {
            if detach {
                self.adapter.remove_node(node);
            }
            detach_kids = false;
        }
        if let Some(node_ref) = &node_ref {
            node_ref.set::<B::Node>(None);
        }

        for kid in kids.into_iter().chain(deletions) {
            self.remove_fiber(kid, detach_kids);
        }
    }
}
