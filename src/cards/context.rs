//! Picks the run that downstream consumers build on.

use super::model::{Card, Run};

/// The most recent run, or `stub` when nothing has been stored yet.
pub fn latest_run<'a>(history: &'a [Run], stub: &'a Run) -> &'a Run {
    history.last().unwrap_or(stub)
}

/// Render cards as bullet lines for model instructions.
pub fn render_context(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| format!("- {}: {}", c.title, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}
