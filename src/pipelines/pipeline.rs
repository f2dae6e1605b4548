//! Pipeline trait.
use crate::error::Error;

/// Implemented by each pipeline,
/// generic over the return type so that callers can inspect what a run produced.
pub trait Pipeline<T> {
    fn run(&self) -> Result<T, Error>;
}
