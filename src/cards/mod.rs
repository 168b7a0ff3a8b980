//! Analysis cards and the logic that produces and selects them.

pub mod context;
pub mod model;
pub mod normalizer;

pub use context::{latest_run, render_context};
pub use model::{Card, Run, RunHistory, stub_run};
pub use normalizer::normalize;
