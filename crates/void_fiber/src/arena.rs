//! Generational fiber storage
//!
//! Fibers refer to each other through [`FiberId`] handles instead of
//! pointers. A slot freed by a removal bumps its generation, so a handle
//! kept past removal never resolves to the fiber that reuses the slot.

use crate::fiber::Fiber;
use std::fmt;

/// Handle to a fiber in a [`FiberArena`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId {
    index: u32,
    generation: u32,
}

impl FiberId {
    /// Get the raw slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FiberId({}v{})", self.index, self.generation)
    }
}

struct Slot<N> {
    fiber: Option<Fiber<N>>,
    generation: u32,
}

/// Arena owning every live fiber of a renderer
pub struct FiberArena<N> {
    slots: Vec<Slot<N>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<N> FiberArena<N> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Store a fiber and return its handle
    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.fiber = Some(fiber);
            FiberId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                fiber: Some(fiber),
                generation: 0,
            });
            FiberId {
                index,
                generation: 0,
            }
        }
    }

    /// Free a fiber's slot, returning the fiber
    pub fn remove(&mut self, id: FiberId) -> Option<Fiber<N>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }

        let fiber = slot.fiber.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        Some(fiber)
    }

    /// Get a fiber
    #[inline]
    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation == id.generation {
            slot.fiber.as_ref()
        } else {
            None
        }
    }

    /// Get a fiber mutably
    #[inline]
    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation == id.generation {
            slot.fiber.as_mut()
        } else {
            None
        }
    }

    /// Check if the handle still resolves
    #[inline]
    pub fn contains(&self, id: FiberId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live fibers
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate over live fibers
    pub fn iter(&self) -> impl Iterator<Item = (FiberId, &Fiber<N>)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.fiber.as_ref().map(|fiber| {
                (
                    FiberId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    fiber,
                )
            })
        })
    }
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self::new()
    }
}
