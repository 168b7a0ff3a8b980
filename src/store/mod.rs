//! Persistence layer for analysis runs.

pub mod runs;

pub use runs::{RunStore, decode_history};
