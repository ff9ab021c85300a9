//! Error types.
//!
//! There are two kinds of failure. [`Error`] is caller misuse, reported
//! before anything is polled or spawned. [`UnitError`] is the failure of a
//! single unit of work; it is stored as that unit's outcome and only
//! surfaces when the outcome is read, never aborting sibling units.

/// Caller misuse of a work-set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// There is nothing to wait on.
    #[error("cannot wait on an empty work-set")]
    EmptyWorkSet,

    /// A unit declared a delay which is negative, NaN or too large.
    #[error("unit {id} declares an invalid delay of {delay}s")]
    InvalidDelay {
        /// The unit's identifier, rendered for display.
        id: String,
        /// The declared delay in seconds.
        delay: f64,
    },

    /// Units of work were spawned outside of a tokio runtime.
    #[error("units of work must be spawned from within a tokio runtime")]
    NoRuntime,
}

/// The failure outcome of a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError<E> {
    /// The unit's function returned an error.
    #[error("{0}")]
    Failed(E),

    /// The unit's function panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The unit was aborted before it finished.
    #[error("cancelled")]
    Cancelled,
}

/// Failure of the thread stress harness.
#[derive(Debug, thiserror::Error)]
pub enum StressError {
    /// The OS refused to start another thread.
    #[error("failed to spawn unit thread {index}")]
    Spawn {
        /// Position of the unit which could not be started.
        index: usize,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A unit thread panicked.
    #[error("unit thread {index} panicked")]
    Panicked {
        /// Position of the first unit which panicked.
        index: usize,
    },
}
