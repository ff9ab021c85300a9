//! Measure the overhead of one OS thread per blocking unit of work.
//!
//! Every unit gets its own thread, all of them are started before any is
//! joined, and the elapsed wall time is reported only once every thread has
//! been joined.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::StressError;

/// Unit threads only sleep, so they get by with a small stack.
const UNIT_STACK_SIZE: usize = 64 * 1024;

/// How often to log progress while spawning.
const PROGRESS_EVERY: usize = 10_000;

/// The outcome of a stress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressReport {
    /// Number of units which ran to completion.
    pub units: usize,
    /// Wall time from spawning the first unit to joining the last.
    pub elapsed: Duration,
}

/// Start `count` threads which each block for `delay`, then join them all.
pub fn spawn_blocking_units(count: usize, delay: Duration) -> Result<StressReport, StressError> {
    run_units(count, move |_| thread::sleep(delay))
}

/// Start `count` threads which each run `unit` with their position, then
/// join them all.
///
/// If a thread can't be started, the ones already running are joined before
/// the error is returned.
pub fn run_units<F>(count: usize, unit: F) -> Result<StressReport, StressError>
where
    F: Fn(usize) + Clone + Send + 'static,
{
    run_units_with(count, spawn_unit, unit)
}

fn spawn_unit(_index: usize, unit: Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().stack_size(UNIT_STACK_SIZE).spawn(unit)
}

/// Like [`run_units`], but every thread is started through `spawn`.
pub(crate) fn run_units_with<F, S>(
    count: usize,
    spawn: S,
    unit: F,
) -> Result<StressReport, StressError>
where
    F: Fn(usize) + Clone + Send + 'static,
    S: Fn(usize, Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>>,
{
    let start = Instant::now();
    let mut handles = Vec::with_capacity(count);

    for index in 0..count {
        let unit = unit.clone();
        match spawn(index, Box::new(move || unit(index))) {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                warn!(index, error = %source, "failed to spawn unit thread, joining the rest");
                // Already reporting the spawn failure.
                let _ = join_all(handles);
                return Err(StressError::Spawn { index, source });
            }
        }
        if (index + 1) % PROGRESS_EVERY == 0 {
            debug!(spawned = index + 1, elapsed = ?start.elapsed(), "spawning unit threads");
        }
    }

    info!(units = count, "waiting for all unit threads");
    join_all(handles)?;

    let elapsed = start.elapsed();
    info!(units = count, ?elapsed, "all unit threads joined");
    Ok(StressReport {
        units: count,
        elapsed,
    })
}

/// Join every handle, reporting the first one which panicked.
fn join_all(handles: Vec<JoinHandle<()>>) -> Result<(), StressError> {
    let mut panicked = None;
    for (index, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() && panicked.is_none() {
            panicked = Some(index);
        }
    }
    match panicked {
        Some(index) => Err(StressError::Panicked { index }),
        None => Ok(()),
    }
}
