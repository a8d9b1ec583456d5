//! Domain logic for chat message logs
//!
//! - `conversation` - Grouping of tool-invoking assistant turns and metric aggregation

pub mod conversation;

pub use conversation::{DisplayMessage, GroupingResult, Message, group_messages, group_messages_with_stats};
