//! Conversation tree reconstruction.
//!
//! Turns a flat, chronologically ordered message log into the grouped display
//! log rendered by chat clients.
//!
//! # Pipeline
//!
//! ```text
//! 1. INDEX     tool_call_id -> tool message, id -> message, tool id -> follow-ups
//! 2. SCAN      forward pass, pass-through or start a group
//! 3. CHAIN     BFS from the group head through tool results to follow-ups
//! 4. SPLIT     per-call metadata -> usage + performance
//! 5. AGGREGATE fold block metrics into the group summary
//! ```
//!
//! Every input id appears exactly once in the output: standalone, as a group
//! child, or (for tool messages) as the `result` of the tool call it answers.

mod chain;
mod grouping;
mod index;
mod metrics;
mod stats;
mod types;


pub use chain::{VisitedTracker, resolve_chain};
pub use grouping::{GroupingResult, group_messages, group_messages_with_stats};
pub use index::MessageIndex;
pub use metrics::{
    MetricField, ModelPerformance, ModelUsage, PERFORMANCE_FIELDS, Reducer,
    USAGE_FIELDS, fold_metrics, split_metadata,
};
pub use stats::{GroupingStats, StatsReport};
pub use types::{
    AssistantContentBlock, AssistantMessage, ChatFileItem, ChatImageItem, ChatRole,
    ChatToolPayload, ChatToolPayloadWithResult, ChatToolResult, DisplayMessage, Envelope,
    GroupedMessage, Message, ModelReasoning, PlainMessage, ToolMessage,
};
