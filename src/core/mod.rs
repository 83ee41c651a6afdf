//! Shared primitives: the crate error type and the millisecond timestamp.

pub mod error;
pub mod timestamp;

pub use error::{Error, Result};
pub use timestamp::Timestamp;
