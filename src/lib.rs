//! Site Analyst: construction-site photo analysis backend.

pub mod api;
pub mod cards;
pub mod config;
pub mod error;
pub mod llm;
pub mod report;
pub mod store;
