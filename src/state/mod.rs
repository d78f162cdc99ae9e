//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `RunState`: the lifecycle of a single scrape run

mod run_state;

// Re-export main types
pub use run_state::RunState;
