//! Waiting on sets of futures.
//!
//! A [`WaitSet`] holds a fixed group of keyed futures. Waiting on it either
//! resolves as soon as one of them completes ([`WaitSet::wait_first`],
//! yielding a [`Partition`] of the done and still-pending futures) or once
//! all of them have ([`WaitSet::wait_all`]).
//!
//! Containers of futures can be waited on directly through [`WaitExt`], in
//! which case the key of each future is its position in the container.

use core::future::{Future, IntoFuture};

use crate::Error;

mod wait_all;
mod wait_first;
mod wait_set;

pub use wait_all::WaitAll;
pub use wait_first::{Done, Partition, WaitFirst};
pub use wait_set::WaitSet;

/// Wait on a container of futures.
pub trait WaitExt {
    /// The key each future is reported under.
    type Key;

    /// The type of future being waited on.
    type Future: Future;

    /// Wait for the first future to complete.
    ///
    /// Runs every future concurrently and resolves as soon as at least one
    /// of them completes, with the remaining futures handed back as the
    /// pending half of the [`Partition`]. Futures which complete during the
    /// same poll are all reported as done.
    ///
    /// Returns [`Error::EmptyWorkSet`] for an empty container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use futures_wait::prelude::*;
    /// use std::future;
    ///
    /// # futures_lite::future::block_on(async {
    /// let futures = vec![future::ready("hello"), future::ready("world")];
    /// let partition = futures.wait_first()?.await;
    /// assert_eq!(partition.done().len(), 2);
    /// # Ok::<(), futures_wait::Error>(())
    /// # }).unwrap();
    /// ```
    fn wait_first(self) -> Result<WaitFirst<Self::Key, Self::Future>, Error>;

    /// Wait for every future to complete, collecting their outputs in the
    /// order they completed.
    fn wait_all(self) -> WaitAll<Self::Key, Self::Future>;
}

impl<Fut> WaitExt for Vec<Fut>
where
    Fut: IntoFuture,
{
    type Key = usize;
    type Future = Fut::IntoFuture;

    fn wait_first(self) -> Result<WaitFirst<Self::Key, Self::Future>, Error> {
        keyed_by_position(self).wait_first()
    }

    fn wait_all(self) -> WaitAll<Self::Key, Self::Future> {
        keyed_by_position(self).wait_all()
    }
}

impl<Fut, const N: usize> WaitExt for [Fut; N]
where
    Fut: IntoFuture,
{
    type Key = usize;
    type Future = Fut::IntoFuture;

    fn wait_first(self) -> Result<WaitFirst<Self::Key, Self::Future>, Error> {
        keyed_by_position(self).wait_first()
    }

    fn wait_all(self) -> WaitAll<Self::Key, Self::Future> {
        keyed_by_position(self).wait_all()
    }
}

fn keyed_by_position<I>(futures: I) -> WaitSet<usize, <I::Item as IntoFuture>::IntoFuture>
where
    I: IntoIterator,
    I::Item: IntoFuture,
{
    futures
        .into_iter()
        .map(IntoFuture::into_future)
        .enumerate()
        .collect()
}
