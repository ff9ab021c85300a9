use core::fmt::{self, Debug};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use super::WaitSet;

/// Wait for the first future in a [`WaitSet`] to complete.
///
/// This `struct` is created by [`WaitSet::wait_first`]. See its
/// documentation for more.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WaitFirst<K, F> {
    set: Option<WaitSet<K, F>>,
}

impl<K, F> WaitFirst<K, F> {
    pub(super) fn new(set: WaitSet<K, F>) -> Self {
        Self { set: Some(set) }
    }
}

impl<K: Debug, F> Debug for WaitFirst<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFirst").field("set", &self.set).finish()
    }
}

impl<K, F: Future> Future for WaitFirst<K, F> {
    type Output = Partition<K, F>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let Some(set) = this.set.as_mut() else {
            panic!("`WaitFirst` must not be polled after completing");
        };

        let mut done = Vec::new();
        set.poll_woken(cx, &mut done);
        if done.is_empty() {
            return Poll::Pending;
        }

        let Some(pending) = this.set.take() else {
            unreachable!("checked above");
        };
        tracing::debug!(
            done = done.len(),
            pending = pending.len(),
            "wait-for-first resolved"
        );
        Poll::Ready(Partition { done, pending })
    }
}

/// The futures of a work-set split by whether they completed.
///
/// Returned by [`WaitFirst`]. Every future that was in the set appears in
/// exactly one of the two halves.
pub struct Partition<K, F: Future> {
    done: Vec<Done<K, F::Output>>,
    pending: WaitSet<K, F>,
}

impl<K, F> Debug for Partition<K, F>
where
    K: Debug,
    F: Future,
    F::Output: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("done", &self.done)
            .field("pending", &self.pending)
            .finish()
    }
}

impl<K, F: Future> Partition<K, F> {
    /// The futures which completed, in the order they were observed to
    /// complete. Never empty.
    pub fn done(&self) -> &[Done<K, F::Output>] {
        &self.done
    }

    /// The futures which had not completed yet.
    pub fn pending(&self) -> &WaitSet<K, F> {
        &self.pending
    }

    /// Look up a completed future by key.
    pub fn get(&self, key: &K) -> Option<&Done<K, F::Output>>
    where
        K: PartialEq,
    {
        self.done.iter().find(|done| done.key() == key)
    }

    /// Split the partition into its completed and pending halves.
    ///
    /// The pending half can be waited on again to keep driving it.
    pub fn into_parts(self) -> (Vec<Done<K, F::Output>>, WaitSet<K, F>) {
        (self.done, self.pending)
    }
}

/// A future which completed, along with its output.
///
/// Reading the output is by reference and can be repeated; it never
/// re-runs the future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Done<K, O> {
    key: K,
    output: O,
}

impl<K, O> Done<K, O> {
    pub(crate) fn new(key: K, output: O) -> Self {
        Self { key, output }
    }

    /// The key the future was inserted under.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The output of the future.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Take the output.
    pub fn into_output(self) -> O {
        self.output
    }

    /// Take the key and the output.
    pub fn into_parts(self) -> (K, O) {
        (self.key, self.output)
    }
}

impl<K, T, E> Done<K, Result<T, E>> {
    /// The result of a fallible future.
    ///
    /// A failure is handed back every time this is called.
    pub fn result(&self) -> Result<&T, &E> {
        self.output.as_ref()
    }

    /// Take the result of a fallible future.
    pub fn into_result(self) -> Result<T, E> {
        self.output
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;
    use std::future;
    use std::rc::Rc;

    /// A future which needs to be polled `remaining` times before it is ready.
    struct Countdown {
        remaining: usize,
        polls: Rc<Cell<usize>>,
    }

    impl Future for Countdown {
        type Output = usize;

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<usize> {
            self.polls.set(self.polls.get() + 1);
            if self.remaining == 0 {
                return Poll::Ready(self.polls.get());
            }
            self.remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    #[test]
    fn first_ready_is_done() {
        futures_lite::future::block_on(async {
            type BoxFuture = Pin<Box<dyn Future<Output = &'static str>>>;
            let futures: Vec<(u8, BoxFuture)> = vec![
                (1, Box::pin(future::pending())),
                (2, Box::pin(future::ready("Result 2"))),
                (3, Box::pin(future::pending())),
            ];
            let set: WaitSet<_, _> = futures.into_iter().collect();

            let partition = set.wait_first().unwrap().await;
            assert_eq!(partition.done().len(), 1);
            assert_eq!(partition.done()[0].key(), &2);
            assert_eq!(partition.done()[0].output(), &"Result 2");
            assert_eq!(partition.pending().keys().collect::<Vec<_>>(), [&1, &3]);
        });
    }

    #[test]
    fn all_ready_in_same_pass_are_done() {
        futures_lite::future::block_on(async {
            let set: WaitSet<_, _> = (0..9).map(|i| (i, future::ready(i * 10))).collect();
            let partition = set.wait_first().unwrap().await;
            assert_eq!(partition.done().len(), 9);
            assert!(partition.pending().is_empty());
        });
    }

    #[test]
    fn partition_covers_the_set() {
        futures_lite::future::block_on(async {
            let polls = Rc::new(Cell::new(0));
            let set: WaitSet<_, _> = [3, 1, 4, 1, 5]
                .into_iter()
                .enumerate()
                .map(|(key, remaining)| {
                    let polls = polls.clone();
                    (key, Countdown { remaining, polls })
                })
                .collect();

            let partition = set.wait_first().unwrap().await;
            let mut keys: Vec<usize> = partition
                .done()
                .iter()
                .map(|done| *done.key())
                .chain(partition.pending().keys().copied())
                .collect();
            keys.sort();
            assert_eq!(keys, [0, 1, 2, 3, 4]);

            let done: Vec<usize> = partition.done().iter().map(|d| *d.key()).collect();
            assert_eq!(done, [1, 3]);
            assert!(partition.pending().keys().all(|key| !done.contains(key)));
        });
    }

    #[test]
    fn pending_half_can_be_driven_to_completion() {
        futures_lite::future::block_on(async {
            let polls = Rc::new(Cell::new(0));
            let set: WaitSet<_, _> = [0, 2, 4]
                .into_iter()
                .map(|remaining| {
                    let polls = polls.clone();
                    (remaining, Countdown { remaining, polls })
                })
                .collect();

            let (done, pending) = set.wait_first().unwrap().await.into_parts();
            assert_eq!(done.len(), 1);
            assert_eq!(done[0].key(), &0);

            let rest = pending.wait_all().await;
            let keys: Vec<_> = rest.iter().map(|d| *d.key()).collect();
            assert_eq!(keys, [2, 4]);
        });
    }

    #[test]
    fn failure_is_resurfaced_on_every_read() {
        futures_lite::future::block_on(async {
            let mut set = WaitSet::new();
            set.insert("bad", future::ready(Err::<u8, _>("boom")));
            set.insert("good", future::ready(Ok(2)));

            let partition = set.wait_first().unwrap().await;
            let bad = partition.get(&"bad").unwrap();
            assert_eq!(bad.result(), Err(&"boom"));
            assert_eq!(bad.result(), Err(&"boom"));
            assert_eq!(partition.get(&"good").unwrap().result(), Ok(&2));
        });
    }

    #[test]
    #[should_panic(expected = "polled after completing")]
    fn poll_after_completion_panics() {
        futures_lite::future::block_on(async {
            let mut set = WaitSet::new();
            set.insert(1, future::ready(1));
            let mut wait = Box::pin(set.wait_first().unwrap());
            let _ = (&mut wait).await;
            let _ = wait.await;
        });
    }
}
