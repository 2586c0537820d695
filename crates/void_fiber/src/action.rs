//! Pending live-tree operations attached to fibers

use crate::arena::FiberId;
use bitflags::bitflags;

bitflags! {
    /// Operations a fiber carries from the differ to the committer.
    /// Flags combine by union; a moved fiber also gets its props updated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpFlags: u8 {
        /// Diff props against the previous render
        const UPDATE = 1 << 1;
        /// Place a freshly created node
        const INSERT = 1 << 2;
        /// Detach the node (differ output only, applied through deletions)
        const REMOVE = 1 << 3;
        /// Relocate an existing node
        const MOVE = 1 << 6;

        /// Flags that put a node somewhere in its parent
        const PLACEMENT = Self::INSERT.bits() | Self::MOVE.bits();
    }
}

/// Operation plus the sibling the node goes in front of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    /// Operation flags
    pub op: OpFlags,
    /// Sibling fiber whose first live node is the insertion point.
    /// `None` appends.
    pub anchor: Option<FiberId>,
}

impl Action {
    /// Create a new action
    pub fn new(op: OpFlags, anchor: Option<FiberId>) -> Self {
        Self { op, anchor }
    }

    /// Update only
    pub fn update() -> Self {
        Self::new(OpFlags::UPDATE, None)
    }

    /// Check if the action places its node
    pub fn is_placement(&self) -> bool {
        self.op.intersects(OpFlags::PLACEMENT)
    }

    /// Merge a forwarded action into this one.
    /// Placement from the forwarder wins the anchor.
    pub fn merge(&mut self, other: Action) {
        if other.is_placement() {
            self.anchor = other.anchor;
        }
        self.op |= other.op;
    }
}
