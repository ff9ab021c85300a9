use core::fmt::{self, Debug};
use core::future::Future;
use core::mem;
use core::pin::Pin;
use core::task::{Context, Poll};

use super::{Done, WaitSet};

/// Wait for every future in a [`WaitSet`] to complete.
///
/// This `struct` is created by [`WaitSet::wait_all`]. See its documentation
/// for more.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WaitAll<K, F: Future> {
    set: WaitSet<K, F>,
    done: Vec<Done<K, F::Output>>,
    consumed: bool,
}

impl<K, F: Future> WaitAll<K, F> {
    pub(super) fn new(set: WaitSet<K, F>) -> Self {
        Self {
            done: Vec::with_capacity(set.len()),
            set,
            consumed: false,
        }
    }
}

// Nothing in here is structurally pinned; see `WaitSet`.
impl<K, F: Future> Unpin for WaitAll<K, F> {}

impl<K, F> Debug for WaitAll<K, F>
where
    K: Debug,
    F: Future,
    F::Output: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitAll")
            .field("pending", &self.set)
            .field("done", &self.done)
            .finish()
    }
}

impl<K, F: Future> Future for WaitAll<K, F> {
    type Output = Vec<Done<K, F::Output>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(
            !this.consumed,
            "`WaitAll` must not be polled after completing"
        );

        this.set.poll_woken(cx, &mut this.done);
        if !this.set.is_empty() {
            return Poll::Pending;
        }

        this.consumed = true;
        tracing::debug!(done = this.done.len(), "wait-for-all resolved");
        Poll::Ready(mem::take(&mut this.done))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::future;
    use std::marker::PhantomPinned;

    fn assert_unpin<T: Unpin>(_: &T) {}

    #[test]
    fn empty_set_resolves_immediately() {
        futures_lite::future::block_on(async {
            let set: WaitSet<u8, future::Pending<()>> = WaitSet::new();
            assert!(set.wait_all().await.is_empty());
        });
    }

    #[test]
    fn every_future_is_reported_once() {
        futures_lite::future::block_on(async {
            let set: WaitSet<_, _> = (1..=4).map(|i| (i, future::ready(i))).collect();
            let mut keys: Vec<_> = set.wait_all().await.into_iter().map(|d| d.into_parts().0).collect();
            keys.sort();
            assert_eq!(keys, [1, 2, 3, 4]);
        });
    }

    #[test]
    fn unpin_regardless_of_keys_and_futures() {
        let mut set = WaitSet::new();
        set.insert(PhantomPinned, async { PhantomPinned });
        let wait = set.wait_all();
        assert_unpin(&wait);

        let mut set = WaitSet::new();
        set.insert(PhantomPinned, async { PhantomPinned });
        let wait = set.wait_first().unwrap();
        assert_unpin(&wait);
    }
}
