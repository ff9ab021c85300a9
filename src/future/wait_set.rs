use core::fmt::{self, Debug};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use slab::Slab;

use super::{Done, WaitAll, WaitFirst};
use crate::utils::WakerSet;
use crate::Error;

/// A keyed set of futures which are waited on as a single unit.
///
/// Futures are added with [`insert`] (or collected from an iterator of
/// `(key, future)` pairs) and then waited on with [`wait_first`] or
/// [`wait_all`]. Both consume the set, so its membership is fixed once
/// waiting begins.
///
/// Every future is boxed on insertion. That lets a [`Partition`] hand the
/// still-pending futures back to the caller without requiring them to be
/// `Unpin`, and makes the set itself `Unpin`.
///
/// All futures in a set share one type. Box them as trait objects to mix
/// different kinds of futures.
///
/// # Example
///
/// ```rust
/// use futures_wait::future::WaitSet;
/// use std::future::{self, Future};
/// use std::pin::Pin;
///
/// type BoxFuture = Pin<Box<dyn Future<Output = u8>>>;
///
/// # futures_lite::future::block_on(async {
/// let mut set: WaitSet<&str, BoxFuture> = WaitSet::new();
/// set.insert("never", Box::pin(future::pending()));
/// set.insert("now", Box::pin(future::ready(1)));
///
/// let partition = set.wait_first().unwrap().await;
/// assert_eq!(partition.done()[0].key(), &"now");
/// assert_eq!(partition.pending().len(), 1);
/// # });
/// ```
///
/// [`insert`]: WaitSet::insert
/// [`wait_first`]: WaitSet::wait_first
/// [`wait_all`]: WaitSet::wait_all
/// [`Partition`]: super::Partition
pub struct WaitSet<K, F> {
    entries: Slab<Entry<K, F>>,
    wakers: WakerSet,
}

struct Entry<K, F> {
    key: K,
    future: Pin<Box<F>>,
}

// Futures live behind their own boxes and keys are never pinned.
impl<K, F> Unpin for WaitSet<K, F> {}

impl<K: Debug, F> Debug for WaitSet<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitSet")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("len", &self.len())
            .finish()
    }
}

impl<K, F> Default for WaitSet<K, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, F> WaitSet<K, F> {
    /// Create a new, empty `WaitSet`.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new, empty `WaitSet` with room for `capacity` futures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Slab::with_capacity(capacity),
            wakers: WakerSet::new(capacity),
        }
    }

    /// Return the number of futures in the set.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no futures.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the keys of the futures in the set, in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(_, entry)| &entry.key)
    }

    /// Iterate over the keys and futures in the set, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &F)> + '_ {
        self.entries
            .iter()
            .map(|(_, entry)| (&entry.key, entry.future.as_ref().get_ref()))
    }

    /// Returns `true` if the set holds a future for `key`.
    pub fn contains_key(&self, key: &K) -> bool
    where
        K: PartialEq,
    {
        self.keys().any(|k| k == key)
    }

    /// Drop the first future stored under `key`, cancelling it.
    ///
    /// Returns whether a future was removed.
    ///
    /// # Example
    ///
    /// ```
    /// use futures_wait::future::WaitSet;
    /// use std::future;
    ///
    /// let mut set = WaitSet::new();
    /// set.insert(1, future::ready(4));
    /// assert!(set.remove(&1));
    /// assert!(!set.remove(&1));
    /// assert!(set.is_empty());
    /// ```
    pub fn remove(&mut self, key: &K) -> bool
    where
        K: PartialEq,
    {
        let index = self
            .entries
            .iter()
            .find(|(_, entry)| &entry.key == key)
            .map(|(index, _)| index);
        match index {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<K, F: Future> WaitSet<K, F> {
    /// Insert a new future into the set.
    ///
    /// Keys don't need to be unique, but every key is reported back in
    /// exactly one half of the resulting [`Partition`](super::Partition).
    pub fn insert(&mut self, key: K, future: F) {
        let index = self.entries.insert(Entry {
            key,
            future: Box::pin(future),
        });
        // A vacated slot may be reused; either way the new future has to be
        // polled at least once.
        self.wakers.grow(index + 1);
        self.wakers.readiness().set_woken(index);
    }

    /// Wait for the first future in the set to complete.
    ///
    /// Resolves to a [`Partition`](super::Partition) of the futures which
    /// completed and the ones still pending. Returns
    /// [`Error::EmptyWorkSet`] right away if there is nothing to wait on.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures_wait::future::WaitSet;
    /// use futures_wait::Error;
    /// use std::future::Ready;
    ///
    /// let set: WaitSet<u8, Ready<()>> = WaitSet::new();
    /// assert_eq!(set.wait_first().unwrap_err(), Error::EmptyWorkSet);
    /// ```
    pub fn wait_first(self) -> Result<WaitFirst<K, F>, Error> {
        if self.is_empty() {
            return Err(Error::EmptyWorkSet);
        }
        Ok(WaitFirst::new(self))
    }

    /// Wait for every future in the set to complete.
    ///
    /// Resolves to the outputs in completion order. An empty set resolves
    /// immediately.
    pub fn wait_all(self) -> WaitAll<K, F> {
        WaitAll::new(self)
    }

    /// Poll every woken future once, moving the ones that complete out of
    /// the set and into `done`.
    pub(crate) fn poll_woken(&mut self, cx: &Context<'_>, done: &mut Vec<Done<K, F::Output>>) {
        {
            let mut readiness = self.wakers.readiness();
            readiness.set_parent_waker(cx.waker());
            if !readiness.any_woken() {
                return;
            }
        }

        for index in 0..self.wakers.len() {
            // Clear the marker before checking the slot so a vacated slot
            // can't keep the set flagged forever.
            if !self.wakers.readiness().take_woken(index) {
                continue;
            }
            let Some(entry) = self.entries.get_mut(index) else {
                continue;
            };

            let mut cx = Context::from_waker(self.wakers.get(index));
            if let Poll::Ready(output) = entry.future.as_mut().poll(&mut cx) {
                let entry = self.entries.remove(index);
                done.push(Done::new(entry.key, output));
            }
        }
    }
}

impl<K, F: Future> FromIterator<(K, F)> for WaitSet<K, F> {
    fn from_iter<T: IntoIterator<Item = (K, F)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut this = Self::with_capacity(iter.size_hint().0);
        this.extend(iter);
        this
    }
}

impl<K, F: Future> Extend<(K, F)> for WaitSet<K, F> {
    fn extend<T: IntoIterator<Item = (K, F)>>(&mut self, iter: T) {
        for (key, future) in iter {
            self.insert(key, future);
        }
    }
}

#[cfg(test)]
mod test {
    use super::WaitSet;
    use crate::Error;
    use core::future::{self, Future};
    use core::pin::Pin;
    use core::task::{Poll, Waker};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn smoke() {
        futures_lite::future::block_on(async {
            let mut set = WaitSet::new();
            set.insert(1, future::ready(2));
            set.insert(2, future::ready(4));
            assert_eq!(set.len(), 2);
            assert!(set.contains_key(&2));
            assert!(!set.contains_key(&3));

            let done = set.wait_all().await;
            let out: i32 = done.iter().map(|d| *d.output()).sum();
            assert_eq!(out, 6);
        });
    }

    #[test]
    fn empty_set_is_rejected() {
        let set: WaitSet<usize, future::Ready<()>> = WaitSet::new();
        assert_eq!(set.wait_first().unwrap_err(), Error::EmptyWorkSet);
    }

    #[test]
    fn keys_follow_insertion_order() {
        let set: WaitSet<_, _> = ["a", "b", "c"]
            .into_iter()
            .map(|key| (key, future::pending::<()>()))
            .collect();
        assert_eq!(set.keys().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn removed_futures_are_not_reported() {
        futures_lite::future::block_on(async {
            let mut set = WaitSet::new();
            set.insert("gone", future::ready(1));
            set.insert("kept", future::ready(2));
            assert!(set.remove(&"gone"));

            let done = set.wait_all().await;
            assert_eq!(done.len(), 1);
            assert_eq!(done[0].key(), &"kept");
        });
    }

    #[test]
    fn reused_slot_is_polled() {
        futures_lite::future::block_on(async {
            let mut set = WaitSet::with_capacity(1);
            set.insert(1, future::ready(1));
            set.remove(&1);
            set.insert(2, future::ready(2));

            let partition = set.wait_first().unwrap().await;
            assert_eq!(partition.done()[0].key(), &2);
        });
    }

    #[test]
    fn stale_wake_on_reused_slot_is_spurious() {
        futures_lite::future::block_on(async {
            type BoxFuture = Pin<Box<dyn Future<Output = u8>>>;
            let stash = Rc::new(RefCell::new(None));
            let stashing = {
                let stash = stash.clone();
                future::poll_fn(move |cx| {
                    *stash.borrow_mut() = Some(cx.waker().clone());
                    Poll::<u8>::Pending
                })
            };

            let mut set: WaitSet<u8, BoxFuture> = WaitSet::new();
            set.insert(1, Box::pin(stashing));
            set.insert(2, Box::pin(future::ready(2)));
            let (_, mut pending) = set.wait_first().unwrap().await.into_parts();

            // Both slots are free again, and the old waker still points at one.
            assert!(pending.remove(&1));
            pending.insert(3, Box::pin(future::pending()));
            pending.insert(4, Box::pin(future::ready(4)));
            let stale: Waker = stash.borrow_mut().take().unwrap();
            stale.wake();

            let partition = pending.wait_first().unwrap().await;
            assert_eq!(partition.done().len(), 1);
            assert_eq!(partition.done()[0].key(), &4);
            assert_eq!(partition.pending().keys().collect::<Vec<_>>(), [&3]);
        });
    }
}
