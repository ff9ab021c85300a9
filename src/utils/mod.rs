//! Utilities to implement the different futures of this crate.

mod readiness;
mod wakers;

pub(crate) use readiness::Readiness;
pub(crate) use wakers::WakerSet;
