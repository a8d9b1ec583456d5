//! Rebuilds grouped display logs from flat chat message logs.
//!
//! - `domain` - Conversation grouping and metric aggregation
//! - `data` - Message log loading and JSON output
//! - `core` - CLI, configuration and application entry point
//! - `utils` - Path helpers

mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
