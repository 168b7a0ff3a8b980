//! PDF report for analysis cards: page layout plus the PDF writer.

pub mod layout;
pub mod pdf;

pub use layout::{FontStyle, Page, ReportLayout, TextDraw};
pub use pdf::{MergeMode, render, render_onto_template};
