use core::num::NonZero;

type RawHandle = u32;

/// A reference to an arena slot.
///
/// The generation is bumped every time a slot is vacated, so a handle that outlives the node it
/// pointed at can no longer reach whatever node reuses the slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle {
    index: NonZero<RawHandle>,
    generation: u32,
}

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        assert!(index <= Self::MAX, "`Handle::new()` - `index` > `Handle::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        let raw = (index + 1) as RawHandle;
        match NonZero::new(raw) {
            Some(index) => Self { index, generation },
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        (self.index.get() - 1) as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}
