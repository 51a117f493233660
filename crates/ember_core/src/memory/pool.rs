//! # Slot Pool
//!
//! Fixed-capacity object slots with a free list and generation-checked handles.

/// Fixed number of object slots, sized once at construction.
///
/// Each slot carries a generation counter that is bumped when the slot is
/// freed. A handle kept past its release therefore resolves to `None` rather
/// than to whichever object reuses the slot later.
///
/// # Thread Safety
///
/// Not synchronized. Keep it behind the owner's lock.
///
/// # Example
///
/// ```rust
/// use ember_core::PoolAllocator;
///
/// let mut slots: PoolAllocator<&str> = PoolAllocator::new(2);
///
/// let handle = slots.allocate("spark").unwrap();
/// assert_eq!(slots.free(handle), Some("spark"));
///
/// // Freed handles go stale
/// assert!(slots.get(handle).is_none());
/// ```
pub struct PoolAllocator<T> {
    slots: Box<[Option<T>]>,
    /// Bumped on every free.
    generations: Box<[u32]>,
    /// Indices of empty slots; the next one handed out is on top.
    vacant: Vec<u32>,
    occupied: usize,
}

/// Copyable reference to one occupied slot.
///
/// Stays valid until that slot is freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> PoolAllocator<T> {
    /// Creates `capacity` empty slots. This is the only allocation the pool
    /// ever makes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or does not fit in a `u32`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            u32::try_from(capacity).is_ok(),
            "Capacity cannot exceed u32::MAX"
        );

        let slots: Vec<Option<T>> = (0..capacity).map(|_| None).collect();

        // Lowest index on top
        #[allow(clippy::cast_possible_truncation)]
        let vacant: Vec<u32> = (0..capacity as u32).rev().collect();

        Self {
            slots: slots.into_boxed_slice(),
            generations: vec![0; capacity].into_boxed_slice(),
            vacant,
            occupied: 0,
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn allocated_count(&self) -> usize {
        self.occupied
    }

    /// Number of empty slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.vacant.len()
    }

    /// Moves `value` into an empty slot. O(1), never allocates.
    ///
    /// # Returns
    ///
    /// `None` when every slot is occupied.
    pub fn allocate(&mut self, value: T) -> Option<PoolHandle> {
        let index = self.vacant.pop()?;
        let slot = index as usize;

        self.slots[slot] = Some(value);
        self.occupied += 1;

        Some(PoolHandle {
            index,
            generation: self.generations[slot],
        })
    }

    /// Empties the slot behind `handle` and returns what it held.
    ///
    /// # Returns
    ///
    /// `None` for stale or foreign handles; nothing is freed in that case.
    pub fn free(&mut self, handle: PoolHandle) -> Option<T> {
        if !self.contains(handle) {
            return None;
        }

        let slot = handle.index as usize;
        let value = self.slots[slot].take()?;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.vacant.push(handle.index);
        self.occupied -= 1;

        Some(value)
    }

    /// Returns true if `handle` still refers to an occupied slot.
    #[inline]
    #[must_use]
    pub fn contains(&self, handle: PoolHandle) -> bool {
        let slot = handle.index as usize;
        self.generations.get(slot) == Some(&handle.generation)
            && self.slots.get(slot).is_some_and(Option::is_some)
    }

    /// Object behind `handle`, if the handle is live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index as usize].as_ref()
    }

    /// Object behind `handle`, mutably, if the handle is live.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index as usize].as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_then_free() {
        let mut slots: PoolAllocator<u32> = PoolAllocator::new(8);

        let handle = slots.allocate(42).unwrap();
        assert_eq!(slots.get(handle), Some(&42));
        assert_eq!(slots.allocated_count(), 1);

        assert_eq!(slots.free(handle), Some(42));
        assert_eq!(slots.allocated_count(), 0);
        assert_eq!(slots.free_count(), 8);
    }

    #[test]
    fn test_exhaustion() {
        let mut slots: PoolAllocator<u8> = PoolAllocator::new(2);

        assert!(slots.allocate(1).is_some());
        assert!(slots.allocate(2).is_some());
        assert!(slots.allocate(3).is_none());
        assert_eq!(slots.free_count(), 0);
    }

    #[test]
    fn test_lowest_index_first() {
        let mut slots: PoolAllocator<u8> = PoolAllocator::new(3);
        assert_eq!(slots.allocate(0).map(PoolHandle::index), Some(0));
        assert_eq!(slots.allocate(0).map(PoolHandle::index), Some(1));
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut slots: PoolAllocator<u32> = PoolAllocator::new(1);

        let old = slots.allocate(1).unwrap();
        slots.free(old);
        let new = slots.allocate(2).unwrap();

        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert_eq!(slots.get(new), Some(&2));

        assert!(slots.get(old).is_none());
        assert!(slots.free(old).is_none());
        assert_eq!(slots.allocated_count(), 1);
    }

    #[test]
    fn test_double_free_is_ignored() {
        let mut slots: PoolAllocator<u32> = PoolAllocator::new(4);
        let handle = slots.allocate(9).unwrap();

        assert_eq!(slots.free(handle), Some(9));
        assert_eq!(slots.free(handle), None);
        assert_eq!(slots.free_count(), 4);
    }

    #[test]
    fn test_get_mut() {
        let mut slots: PoolAllocator<u32> = PoolAllocator::new(2);
        let handle = slots.allocate(1).unwrap();

        *slots.get_mut(handle).unwrap() += 5;

        assert_eq!(slots.get(handle), Some(&6));
    }
}
