use super::handle::Handle;

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    element: Option<T>,
}

/// Slot storage for tree nodes.
///
/// Vacated slots are recycled, and every recycle bumps the slot's generation so stale handles are
/// caught instead of silently aliasing the new occupant. `clear` vacates every slot the same way.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(index) = self.free.pop() {
            // Reuse a vacated slot under its current generation.
            let slot = &mut self.slots[index];
            slot.element = Some(element);
            Handle::new(index, slot.generation)
        } else {
            assert!(
                self.slots.len() <= Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            Handle::new(self.slots.len() - 1, 0)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        match self.slots.get(handle.index()) {
            Some(slot) if slot.generation == handle.generation() => {
                slot.element.as_ref().expect("`Arena::get()` - `handle` is invalid!")
            }
            _ => panic!("`Arena::get()` - `handle` is stale!"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.generation == handle.generation() => {
                slot.element.as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
            }
            _ => panic!("`Arena::get_mut()` - `handle` is stale!"),
        }
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let slot = match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.generation == handle.generation() => slot,
            _ => panic!("`Arena::take()` - `handle` is stale!"),
        };
        let element = slot.element.take().expect("`Arena::take()` - `handle` is invalid!");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
        self.free.clear();
        // Reverse order so the lowest slot is reused first.
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.element.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index);
        }
    }
}
