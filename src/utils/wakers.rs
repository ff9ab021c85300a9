use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Wake, Waker};

use super::Readiness;

/// The waker handed to the future in one slot of a work-set.
///
/// Waking it flags the slot in the shared [`Readiness`] and forwards the wake
/// to the parent task the first time the slot is flagged.
#[derive(Debug)]
struct SlotWaker {
    index: usize,
    readiness: Arc<Mutex<Readiness>>,
}

impl Wake for SlotWaker {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref()
    }

    fn wake_by_ref(self: &Arc<Self>) {
        let parent = {
            let mut readiness = lock(&self.readiness);
            if readiness.set_woken(self.index) {
                None
            } else {
                readiness.parent_waker().cloned()
            }
        };
        // The parent may not be registered yet if we're woken before the
        // first poll; the slot stays flagged and is picked up by that poll.
        if let Some(parent) = parent {
            parent.wake();
        }
    }
}

/// One waker per slot, all sharing a single [`Readiness`].
#[derive(Debug)]
pub(crate) struct WakerSet {
    wakers: Vec<Waker>,
    readiness: Arc<Mutex<Readiness>>,
}

impl WakerSet {
    pub(crate) fn new(len: usize) -> Self {
        let readiness = Arc::new(Mutex::new(Readiness::new(len)));
        let wakers = (0..len)
            .map(|index| slot_waker(index, &readiness))
            .collect();
        Self { wakers, readiness }
    }

    pub(crate) fn len(&self) -> usize {
        self.wakers.len()
    }

    /// The waker for the slot at `index`.
    pub(crate) fn get(&self, index: usize) -> &Waker {
        &self.wakers[index]
    }

    /// Lock the shared `Readiness`.
    pub(crate) fn readiness(&self) -> MutexGuard<'_, Readiness> {
        lock(&self.readiness)
    }

    /// Make sure there is a waker for every slot below `len`.
    pub(crate) fn grow(&mut self, len: usize) {
        let mut index = self.wakers.len();
        if len <= index {
            return;
        }
        let readiness = self.readiness.clone();
        self.wakers.resize_with(len, || {
            let waker = slot_waker(index, &readiness);
            index += 1;
            waker
        });
        let mut readiness = lock(&self.readiness);
        readiness.grow(len);
        debug_assert_eq!(readiness.len(), self.wakers.len());
    }
}

fn slot_waker(index: usize, readiness: &Arc<Mutex<Readiness>>) -> Waker {
    Arc::new(SlotWaker {
        index,
        readiness: readiness.clone(),
    })
    .into()
}

// `Readiness` holds plain flags, so a panic while it was locked can't leave
// it in a state worth refusing.
fn lock(readiness: &Mutex<Readiness>) -> MutexGuard<'_, Readiness> {
    readiness.lock().unwrap_or_else(PoisonError::into_inner)
}
