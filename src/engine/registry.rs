//! Live Object Registry - Generational slot allocation.
//!
//! Manages the lifecycle of live object slots:
//! - Free index pool for O(1) reuse
//! - Generation counter per slot, bumped on release
//! - Handles carry (index, generation), so a handle to a released slot
//!   never resolves to the slot's next occupant

use std::fmt;

// =============================================================================
// Handle
// =============================================================================

/// Handle to a live object held by a [`Reconciler`](crate::Reconciler).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiveObjectHandle {
    index: usize,
    generation: u32,
}

impl LiveObjectHandle {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for LiveObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// =============================================================================
// Registry
// =============================================================================

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage indexed by [`LiveObjectHandle`].
pub struct ObjectRegistry<T> {
    slots: Vec<Slot<T>>,
    /// Pool of freed indices for reuse.
    free_indices: Vec<usize>,
    live: usize,
}

impl<T> Default for ObjectRegistry<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            live: 0,
        }
    }
}

impl<T> ObjectRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, reusing a freed slot when one is available.
    pub fn allocate(&mut self, value: T) -> LiveObjectHandle {
        self.live += 1;

        // Reuse free index or allocate new
        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return LiveObjectHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        LiveObjectHandle {
            index,
            generation: 0,
        }
    }

    /// Remove the value behind `handle` and return the slot to the pool.
    ///
    /// Returns `None` for stale handles.
    pub fn release(&mut self, handle: LiveObjectHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;

        // Bump generation so outstanding handles go stale.
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(handle.index);
        self.live -= 1;
        Some(value)
    }

    pub fn get(&self, handle: LiveObjectHandle) -> Option<&T> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: LiveObjectHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, handle: LiveObjectHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (LiveObjectHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    LiveObjectHandle {
                        index,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
