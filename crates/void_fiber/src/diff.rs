//! Keyed list differ
//!
//! Compares the identities of the previous children with the identities of
//! the new descriptions and produces one operation per new position plus
//! the old positions to remove.
//!
//! ```text
//! old: [A B C D]        new: [B A D E]
//!
//!  i=0 A  j=0 B   B is elsewhere in old   ──► MOVE  old[1] before old[0]
//!  i=0 A  j=1 A   same identity           ──► UPDATE old[0]
//!  i=1 B          consumed by the move    ──► skip
//!  i=2 C  j=2 D   C absent from new       ──► REMOVE old[2]
//!  i=3 D  j=2 D   same identity           ──► UPDATE old[3]
//!         j=3 E   old exhausted           ──► INSERT at end
//! ```
//!
//! Duplicate identities are matched by occurrence: the n-th new item with
//! identity `K` pairs with the n-th old item with identity `K`.

use std::collections::HashMap;
use std::hash::Hash;

/// Operation for one new position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// Create a new item before old position `before` (`None` appends)
    Insert { before: Option<usize> },
    /// Reuse old position `old` in place
    Update { old: usize },
    /// Reuse old position `old` and relocate it before old position `before`
    Move { old: usize, before: Option<usize> },
}

impl DiffOp {
    /// Old position reused by this op
    pub fn reused(&self) -> Option<usize> {
        match *self {
            DiffOp::Update { old } | DiffOp::Move { old, .. } => Some(old),
            DiffOp::Insert { .. } => None,
        }
    }
}

/// Result of diffing two lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    /// One op per new position, in new order
    pub ops: Vec<DiffOp>,
    /// Old positions with no counterpart, in old order
    pub removed: Vec<usize>,
}

impl Patch {
    /// Number of inserts
    pub fn inserts(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DiffOp::Insert { .. })).count()
    }

    /// Number of moves
    pub fn moves(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DiffOp::Move { .. })).count()
    }

    /// Number of in-place updates
    pub fn updates(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, DiffOp::Update { .. })).count()
    }

    /// True when nothing is created, moved or removed
    pub fn is_stable(&self) -> bool {
        self.removed.is_empty() && self.ops.iter().all(|op| matches!(op, DiffOp::Update { .. }))
    }
}

/// Pair every identity with its occurrence ordinal
fn ordinals<K: Eq + Hash>(list: &[K]) -> Vec<(&K, usize)> {
    let mut seen: HashMap<&K, usize> = HashMap::with_capacity(list.len());
    list.iter()
        .map(|key| {
            let n = seen.entry(key).or_insert(0);
            let ordinal = *n;
            *n += 1;
            (key, ordinal)
        })
        .collect()
}

/// Diff `old` identities against `new` identities
pub fn diff<K: Eq + Hash>(old: &[K], new: &[K]) -> Patch {
    let a = ordinals(old);
    let b = ordinals(new);

    let old_index: HashMap<(&K, usize), usize> = a.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let new_index: HashMap<(&K, usize), usize> = b.iter().enumerate().map(|(j, id)| (*id, j)).collect();

    let mut patch = Patch {
        ops: Vec::with_capacity(b.len()),
        removed: Vec::new(),
    };
    let mut consumed = vec![false; a.len()];
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        if i < a.len() && consumed[i] {
            i += 1;
            continue;
        }

        if j >= b.len() {
            patch.removed.push(i);
            i += 1;
            continue;
        }

        if i >= a.len() {
            patch.ops.push(DiffOp::Insert { before: None });
            j += 1;
            continue;
        }

        if a[i] == b[j] {
            patch.ops.push(DiffOp::Update { old: i });
            i += 1;
            j += 1;
            continue;
        }

        if !new_index.contains_key(&a[i]) {
            patch.removed.push(i);
            i += 1;
            continue;
        }

        match old_index.get(&b[j]) {
            Some(&k) if k > i && !consumed[k] => {
                patch.ops.push(DiffOp::Move {
                    old: k,
                    before: Some(i),
                });
                consumed[k] = true;
            }
            _ => patch.ops.push(DiffOp::Insert { before: Some(i) }),
        }
        j += 1;
    }

    patch
}
