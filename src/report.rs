//! Progress reporting.
//!
//! Units of work and summaries emit [`Event`]s into a caller-provided
//! [`Sink`] rather than printing directly. [`Stdout`] prints them one per
//! line; [`Recorder`] keeps them for inspection.

use core::fmt::{self, Debug, Display};
use core::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use crate::future::{Done, Partition};

/// Something that happened to a unit of work or a work-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<K> {
    /// A unit started executing.
    Started {
        /// The unit's identifier.
        id: K,
    },
    /// A unit produced its result.
    Completed {
        /// The unit's identifier.
        id: K,
    },
    /// A unit failed.
    Failed {
        /// The unit's identifier.
        id: K,
        /// Description of the failure.
        error: String,
    },
    /// A wait-for-first call resolved.
    Partitioned {
        /// Number of units which were done.
        done: usize,
        /// Number of units still running.
        pending: usize,
    },
    /// The result of a completed unit was read.
    Finished {
        /// The unit's identifier.
        id: K,
        /// The result, rendered for display.
        value: String,
    },
    /// The result of a failed unit was read.
    FinishedWithError {
        /// The unit's identifier.
        id: K,
        /// Description of the failure.
        error: String,
    },
    /// A unit was still running when the wait resolved.
    StillPending {
        /// The unit's identifier.
        id: K,
    },
}

impl<K: Display> Display for Event<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Started { id } => write!(f, "Task {id} started"),
            Event::Completed { id } => write!(f, "Task {id} completed"),
            Event::Failed { id, error } => write!(f, "Task {id} failed: {error}"),
            Event::Partitioned { done, pending } => {
                write!(f, "{done} task(s) completed, {pending} still running")
            }
            Event::Finished { id, value } => write!(f, "Task {id} -> {value}"),
            Event::FinishedWithError { id, error } => write!(f, "Task {id} -> error: {error}"),
            Event::StillPending { id } => write!(f, "Task {id} is still pending"),
        }
    }
}

/// Receives progress events.
///
/// Sinks are shared with every spawned unit, so they have to be usable from
/// several threads at once.
pub trait Sink<K>: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: Event<K>);
}

impl<K, S: Sink<K> + ?Sized> Sink<K> for Arc<S> {
    fn emit(&self, event: Event<K>) {
        (**self).emit(event)
    }
}

impl<K, S: Sink<K> + ?Sized> Sink<K> for &S {
    fn emit(&self, event: Event<K>) {
        (**self).emit(event)
    }
}

/// Prints every event to standard output, one line each.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout;

impl<K: Display> Sink<K> for Stdout {
    fn emit(&self, event: Event<K>) {
        println!("{event}");
    }
}

/// Keeps every event in memory.
///
/// Clones share the same buffer, so a clone can be handed to the units of
/// work while the original is kept to read the events back.
///
/// # Example
///
/// ```rust
/// use futures_wait::report::{Event, Recorder, Sink};
///
/// let recorder = Recorder::new();
/// recorder.clone().emit(Event::Started { id: 1 });
/// assert_eq!(recorder.events(), [Event::Started { id: 1 }]);
/// ```
pub struct Recorder<K> {
    events: Arc<Mutex<Vec<Event<K>>>>,
}

impl<K> Recorder<K> {
    /// Create a new, empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<Event<K>>
    where
        K: Clone,
    {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<K> Clone for Recorder<K> {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
        }
    }
}

impl<K> Default for Recorder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug> Debug for Recorder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("events", &self.events)
            .finish()
    }
}

impl<K: Send> Sink<K> for Recorder<K> {
    fn emit(&self, event: Event<K>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Report the outcome of a completed unit.
pub fn report_done<K, T, E, S>(done: &Done<K, Result<T, E>>, sink: &S)
where
    K: Clone,
    T: Display,
    E: Display,
    S: Sink<K> + ?Sized,
{
    let id = done.key().clone();
    match done.result() {
        Ok(value) => sink.emit(Event::Finished {
            id,
            value: value.to_string(),
        }),
        Err(error) => sink.emit(Event::FinishedWithError {
            id,
            error: error.to_string(),
        }),
    }
}

/// Report a resolved wait: the counts, then every done unit's outcome, then
/// every unit still pending.
pub fn summarize<K, F, T, E, S>(partition: &Partition<K, F>, sink: &S)
where
    K: Clone,
    F: Future<Output = Result<T, E>>,
    T: Display,
    E: Display,
    S: Sink<K> + ?Sized,
{
    sink.emit(Event::Partitioned {
        done: partition.done().len(),
        pending: partition.pending().len(),
    });
    for done in partition.done() {
        report_done(done, sink);
    }
    for id in partition.pending().keys() {
        sink.emit(Event::StillPending { id: id.clone() });
    }
}
