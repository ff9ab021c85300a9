//! Units of work running on a tokio runtime.
//!
//! A [`WorkItem`] describes one unit: an identifier, a delay, and a function
//! producing the unit's result once the delay has elapsed. [`spawn_all`]
//! starts a set of units and hands back a [`WaitSet`] of [`Task`] handles;
//! [`run_and_wait_for_first`] also waits until at least one of them is done.
//!
//! Pending units keep running in the background after the wait resolves.
//! Dropping their handles (or calling [`Partition::abort_pending`]) aborts
//! them, so discarding the pending half never leaks a running unit.
//!
//! # Example
//!
//! ```rust
//! use futures_wait::report::Recorder;
//! use futures_wait::work::{self, WorkItem};
//! use std::convert::Infallible;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() -> Result<(), futures_wait::Error> {
//! let items = [(1, 3), (2, 2), (3, 1), (4, 5)].map(|(id, secs)| {
//!     WorkItem::new(id, Duration::from_secs(secs), move || {
//!         Ok::<_, Infallible>(format!("Result {id}"))
//!     })
//! });
//!
//! let partition = work::run_and_wait_for_first(items, Recorder::new()).await?;
//! assert_eq!(partition.done()[0].key(), &3);
//! assert_eq!(partition.done()[0].result().unwrap(), "Result 3");
//! assert_eq!(partition.pending().len(), 3);
//! # Ok(())
//! # }
//! ```

use core::fmt::{self, Debug, Display};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use crate::future::{Partition, WaitSet};
use crate::report::{Event, Sink};
use crate::Error;

mod task;

pub use task::Task;

type Produce<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send>;

/// The declared delay of a unit, checked when the unit is spawned.
#[derive(Debug, Clone, Copy)]
enum Delay {
    Exact(Duration),
    Secs(f64),
}

impl Delay {
    fn resolve(self) -> Option<Duration> {
        match self {
            Delay::Exact(delay) => Some(delay),
            Delay::Secs(secs) => Duration::try_from_secs_f64(secs).ok(),
        }
    }

    fn as_secs_f64(self) -> f64 {
        match self {
            Delay::Exact(delay) => delay.as_secs_f64(),
            Delay::Secs(secs) => secs,
        }
    }
}

/// Describes a unit of work which has not been started yet.
pub struct WorkItem<K, T, E> {
    id: K,
    delay: Delay,
    produce: Produce<T, E>,
}

impl<K, T, E> WorkItem<K, T, E> {
    /// A unit which calls `produce` once `delay` has elapsed.
    pub fn new<P>(id: K, delay: Duration, produce: P) -> Self
    where
        P: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self {
            id,
            delay: Delay::Exact(delay),
            produce: Box::new(produce),
        }
    }

    /// A unit whose delay is given in seconds.
    ///
    /// The delay isn't checked until the unit is spawned: a negative, NaN or
    /// overflowing value makes [`spawn_all`] fail with
    /// [`Error::InvalidDelay`] before any unit is started.
    pub fn from_secs<P>(id: K, secs: f64, produce: P) -> Self
    where
        P: FnOnce() -> Result<T, E> + Send + 'static,
    {
        Self {
            id,
            delay: Delay::Secs(secs),
            produce: Box::new(produce),
        }
    }

    /// The unit's identifier.
    pub fn id(&self) -> &K {
        &self.id
    }
}

impl<K: Debug, T, E> Debug for WorkItem<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("id", &self.id)
            .field("delay", &self.delay.as_secs_f64())
            .finish()
    }
}

/// Start every unit on the current tokio runtime.
///
/// The whole set is checked before anything is spawned: an empty set, an
/// invalid delay, or a missing runtime is reported as an [`Error`] and no
/// unit is started.
pub fn spawn_all<K, T, E, S>(
    items: impl IntoIterator<Item = WorkItem<K, T, E>>,
    sink: S,
) -> Result<WaitSet<K, Task<T, E>>, Error>
where
    K: Clone + Display + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    S: Sink<K> + Clone + 'static,
{
    let items: Vec<_> = items.into_iter().collect();
    if items.is_empty() {
        return Err(Error::EmptyWorkSet);
    }

    let mut units = Vec::with_capacity(items.len());
    for item in items {
        let Some(delay) = item.delay.resolve() else {
            return Err(Error::InvalidDelay {
                id: item.id.to_string(),
                delay: item.delay.as_secs_f64(),
            });
        };
        units.push((item, delay));
    }

    let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
    let mut set = WaitSet::with_capacity(units.len());
    for (WorkItem { id, produce, .. }, delay) in units {
        let unit = run_unit(id.clone(), delay, produce, sink.clone());
        set.insert(id, Task::new(runtime.spawn(unit)));
    }
    debug!(units = set.len(), "spawned work-set");
    Ok(set)
}

/// Start every unit and wait until at least one of them is done.
///
/// See [`spawn_all`] for the errors, and [`WaitSet::wait_first`] for how
/// the partition is computed.
pub async fn run_and_wait_for_first<K, T, E, S>(
    items: impl IntoIterator<Item = WorkItem<K, T, E>>,
    sink: S,
) -> Result<Partition<K, Task<T, E>>, Error>
where
    K: Clone + Display + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
    S: Sink<K> + Clone + 'static,
{
    let wait = spawn_all(items, sink)?.wait_first()?;
    Ok(wait.await)
}

impl<K, T, E> Partition<K, Task<T, E>> {
    /// Abort every unit which is still pending.
    pub fn abort_pending(&self) {
        for (_, task) in self.pending().iter() {
            task.abort();
        }
    }
}

async fn run_unit<K, T, E, S>(id: K, delay: Duration, produce: Produce<T, E>, sink: S) -> Result<T, E>
where
    K: Clone + Display,
    E: Display,
    S: Sink<K>,
{
    debug!(unit = %id, ?delay, "unit started");
    sink.emit(Event::Started { id: id.clone() });

    tokio::time::sleep(delay).await;
    let result = produce();

    match &result {
        Ok(_) => {
            debug!(unit = %id, "unit completed");
            sink.emit(Event::Completed { id });
        }
        Err(error) => {
            debug!(unit = %id, %error, "unit failed");
            sink.emit(Event::Failed {
                id,
                error: error.to_string(),
            });
        }
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::report::Recorder;
    use std::convert::Infallible;

    fn item(id: u32, secs: f64) -> WorkItem<u32, u32, Infallible> {
        WorkItem::from_secs(id, secs, move || Ok(id))
    }

    #[test]
    fn empty_set_is_rejected() {
        let items: Vec<WorkItem<u32, u32, Infallible>> = Vec::new();
        let err = spawn_all(items, Recorder::new()).unwrap_err();
        assert_eq!(err, Error::EmptyWorkSet);
    }

    #[test]
    fn negative_delay_is_rejected_before_spawning() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let _guard = runtime.enter();

        let recorder = Recorder::new();
        let err = spawn_all(vec![item(1, 1.0), item(2, -1.0)], recorder.clone()).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidDelay {
                id: "2".into(),
                delay: -1.0
            }
        );
        assert_eq!(err.to_string(), "unit 2 declares an invalid delay of -1s");
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn nan_delay_is_rejected() {
        let err = spawn_all(vec![item(7, f64::NAN)], Recorder::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidDelay { ref id, .. } if id == "7"));
    }

    #[test]
    fn spawning_needs_a_runtime() {
        let err = spawn_all(vec![item(1, 1.0)], Recorder::new()).unwrap_err();
        assert_eq!(err, Error::NoRuntime);
    }
}
