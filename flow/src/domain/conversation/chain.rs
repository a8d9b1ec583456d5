//! Follow-up chain resolution.
//!
//! A group starts at an assistant message that issued tool calls. The model
//! usually continues after reading the tool results: those continuations are
//! assistant messages whose `parentId` is one of the tool messages, and they
//! may call tools of their own. Resolution walks this chain breadth-first:
//!
//! ```text
//! head (tools a, b) ──► tool A ──► follow-up 1 (tool c) ──► tool C ──► final answer
//!                   └─► tool B
//! frontier:  [A, B]            [C]                              []
//! ```
//!
//! Every assistant discovered this way becomes the next block of the group.
//! Termination does not depend on the shape of the data: a tool message
//! enters the frontier only the first time it is consumed and an assistant
//! is appended only the first time it is seen, so cyclic or duplicated
//! `parentId` links end the walk instead of looping.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::index::MessageIndex;
use super::metrics::split_metadata;
use super::types::{AssistantContentBlock, AssistantMessage, ChatToolPayloadWithResult, ChatToolResult};

/// Consumption state of one grouping run.
///
/// Tool messages folded into a group are not emitted standalone, and
/// assistants already placed in the output are not placed again.
#[derive(Debug, Default)]
pub struct VisitedTracker<'a> {
    tools: FxHashSet<&'a str>,
    assistants: FxHashSet<&'a str>,
}

impl<'a> VisitedTracker<'a> {
    /// Mark a tool message consumed. Returns `false` if it already was.
    pub fn consume_tool(&mut self, tool_message_id: &'a str) -> bool {
        self.tools.insert(tool_message_id)
    }

    pub fn is_tool_consumed(&self, tool_message_id: &str) -> bool {
        self.tools.contains(tool_message_id)
    }

    /// Mark an assistant placed. Returns `false` if it already was.
    pub fn consume_assistant(&mut self, assistant_id: &'a str) -> bool {
        self.assistants.insert(assistant_id)
    }

    pub fn is_assistant_consumed(&self, assistant_id: &str) -> bool {
        self.assistants.contains(assistant_id)
    }
}

/// Build the content block of one assistant turn.
///
/// Tool calls are matched against tool messages; calls without a tool
/// message keep `result: None`. Returns the block together with the ids of
/// tool messages consumed for the first time, which feed the next frontier.
fn build_block<'a>(
    assistant: &'a AssistantMessage,
    index: &MessageIndex<'a>,
    visited: &mut VisitedTracker<'a>,
) -> (AssistantContentBlock, Vec<&'a str>) {
    let mut consumed = Vec::new();
    let mut tools = Vec::with_capacity(assistant.tools.as_ref().map_or(0, Vec::len));

    for payload in assistant.tools.iter().flatten() {
        let result = index.tool_result(&payload.id).map(|tool| {
            let tool_message_id = tool.envelope.id.as_str();
            if visited.consume_tool(tool_message_id) {
                consumed.push(tool_message_id);
            }
            ChatToolResult::from(tool)
        });
        tools.push(ChatToolPayloadWithResult {
            payload: payload.clone(),
            result,
        });
    }

    let (usage, performance) = split_metadata(assistant.metadata.as_ref());

    let block = AssistantContentBlock {
        id: assistant.envelope.id.clone(),
        content: assistant.content.clone(),
        tools: non_empty(tools),
        image_list: assistant.image_list.clone().and_then(non_empty),
        file_list: assistant.file_list.clone().and_then(non_empty),
        reasoning: assistant.reasoning.clone(),
        error: assistant.error.clone(),
        usage,
        performance,
    };

    (block, consumed)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Resolve the head block of a group and every follow-up chained onto it.
///
/// Blocks are returned in discovery order, head first. The head and every
/// discovered follow-up are marked consumed in `visited`.
pub fn resolve_chain<'a>(
    head: &'a AssistantMessage,
    index: &MessageIndex<'a>,
    visited: &mut VisitedTracker<'a>,
) -> Vec<AssistantContentBlock> {
    visited.consume_assistant(head.envelope.id.as_str());

    let (head_block, head_tools) = build_block(head, index, visited);
    let mut blocks = vec![head_block];
    let mut frontier: VecDeque<&'a str> = head_tools.into();

    while let Some(tool_message_id) = frontier.pop_front() {
        for follow_up in index.follow_ups(tool_message_id).iter().copied() {
            if !visited.consume_assistant(follow_up.envelope.id.as_str()) {
                continue;
            }
            let (block, resolved) = build_block(follow_up, index, visited);
            tracing::trace!(
                head_id = %head.envelope.id,
                follow_up_id = %follow_up.envelope.id,
                parent_tool_id = %tool_message_id,
                new_tool_results = resolved.len(),
                "Attached follow-up block"
            );
            blocks.push(block);
            frontier.extend(resolved);
        }
    }

    blocks
}
