use core::fmt::{self, Debug};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures_core::ready;
use tokio::task::{JoinError, JoinHandle};

use crate::UnitError;

/// A handle to a unit of work running on the tokio runtime.
///
/// Resolves to the unit's outcome. The unit keeps running in the background
/// whether or not the handle is polled, and is aborted when the handle is
/// dropped.
pub struct Task<T, E> {
    handle: JoinHandle<Result<T, E>>,
}

impl<T, E> Task<T, E> {
    pub(crate) fn new(handle: JoinHandle<Result<T, E>>) -> Self {
        Self { handle }
    }

    /// Ask the unit to stop.
    ///
    /// Its delay timer is released the next time the runtime gets to it, and
    /// the handle then resolves to [`UnitError::Cancelled`] unless the unit
    /// had already finished.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Returns `true` if the unit has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T, E> Debug for Task<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl<T, E> Future for Task<T, E> {
    type Output = Result<T, UnitError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let output = match ready!(Pin::new(&mut self.handle).poll(cx)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(UnitError::Failed(error)),
            Err(error) => Err(join_error(error)),
        };
        Poll::Ready(output)
    }
}

impl<T, E> Drop for Task<T, E> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn join_error<E>(error: JoinError) -> UnitError<E> {
    if error.is_cancelled() {
        return UnitError::Cancelled;
    }
    match error.try_into_panic() {
        Ok(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            UnitError::Panicked(message)
        }
        Err(_) => UnitError::Cancelled,
    }
}
