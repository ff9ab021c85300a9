//! Wait for the first of a set of concurrent units of work to finish, and
//! find out which are done and which are still pending.
//!
//! The purpose of this library is to package the "wait for first
//! completion" pattern: run a fixed set of futures concurrently, suspend
//! until at least one of them reaches a terminal state, then partition the
//! set into the ones that are done and the ones still running. See the
//! [`future`] and [`work`] submodules for more.
//!
//! # Operations
//!
//! - [`future::WaitSet::wait_first`]: wait until at least one future is done.
//! - [`future::WaitSet::wait_all`]: wait until every future is done.
//! - [`work::run_and_wait_for_first`]: spawn delayed units of work on tokio
//!   and wait for the first of them.
//! - [`stress::spawn_blocking_units`]: start and join one OS thread per unit.
//!
//! # Examples
//!
//! Wait on a vector of futures, keyed by their position:
//! ```rust
//! use futures_wait::prelude::*;
//! use futures_lite::future::block_on;
//! use std::future;
//!
//! block_on(async {
//!     let futures = vec![future::ready(1u8), future::ready(2u8)];
//!     let partition = futures.wait_first().unwrap().await;
//!     assert_eq!(partition.done().len() + partition.pending().len(), 2);
//! })
//! ```
//!
//! # Pending futures
//!
//! The pending half of a [`future::Partition`] is handed back to the caller.
//! Plain futures only make progress while they are polled, so they stand
//! still until the pending set is waited on again, and dropping them cancels
//! them. Units spawned through [`work`] keep running on the runtime and are
//! aborted when their [`work::Task`] handle is dropped.

#![deny(missing_debug_implementations, nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

mod error;
mod utils;

/// The futures-wait prelude.
pub mod prelude {
    pub use super::future::WaitExt as _;
}

pub mod future;
pub mod report;
pub mod stress;
pub mod work;

pub use error::{Error, StressError, UnitError};
