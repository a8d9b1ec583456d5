//! Data layer
//!
//! - `log` - Message log loading (JSON / JSONL) and display log writing
//! - `error` - Error type for the data layer

pub mod error;
pub mod log;

pub use error::DataError;
pub use log::{LogSource, parse_messages, read_messages, write_json};
