use core::task::Waker;
use fixedbitset::FixedBitSet;

/// Tracks which slots of a work-set were woken since they were last polled.
#[derive(Debug)]
pub(crate) struct Readiness {
    woken_count: usize,
    woken: FixedBitSet,
    parent_waker: Option<Waker>,
}

impl Readiness {
    /// Create a new instance where every slot starts out woken, so the first
    /// poll visits every future.
    pub(crate) fn new(len: usize) -> Self {
        let mut woken = FixedBitSet::with_capacity(len);
        woken.insert_range(..);
        Self {
            woken_count: len,
            woken,
            parent_waker: None,
        }
    }

    /// Number of slots tracked.
    pub(crate) fn len(&self) -> usize {
        self.woken.len()
    }

    /// Mark the slot as woken.
    ///
    /// Returns the previous state of the slot.
    pub(crate) fn set_woken(&mut self, index: usize) -> bool {
        let was_woken = self.woken.put(index);
        if !was_woken {
            self.woken_count += 1;
        }
        was_woken
    }

    /// Clear the woken marker for the slot.
    ///
    /// Returns whether the slot was woken.
    pub(crate) fn take_woken(&mut self, index: usize) -> bool {
        if self.woken[index] {
            self.woken_count -= 1;
            self.woken.set(index, false);
            true
        } else {
            false
        }
    }

    /// Returns `true` if any slot was woken.
    pub(crate) fn any_woken(&self) -> bool {
        self.woken_count > 0
    }

    /// Access the parent waker.
    #[inline]
    pub(crate) fn parent_waker(&self) -> Option<&Waker> {
        self.parent_waker.as_ref()
    }

    /// Set the parent `Waker`. This needs to be called at the start of every
    /// `poll` function.
    pub(crate) fn set_parent_waker(&mut self, parent_waker: &Waker) {
        match &mut self.parent_waker {
            Some(prev) => prev.clone_from(parent_waker),
            None => self.parent_waker = Some(parent_waker.clone()),
        }
    }

    /// Grow to `len` slots. New slots start out woken; shrinking is a no-op.
    ///
    /// Slots are reused after their future is removed, so a waker left over
    /// from the old future can still flag the slot. That only costs the new
    /// future one spurious poll.
    pub(crate) fn grow(&mut self, len: usize) {
        let old_len = self.woken.len();
        if len <= old_len {
            return;
        }
        self.woken.grow(len);
        self.woken.insert_range(old_len..len);
        self.woken_count += len - old_len;
    }
}
