//! Grouping pass.
//!
//! One forward scan over the log. Pass-through messages keep their position;
//! every unconsumed assistant that issued tool calls becomes a `group` node
//! in its place, absorbing its tool results and chained follow-ups.

use super::chain::{VisitedTracker, resolve_chain};
use super::index::MessageIndex;
use super::metrics::{ModelPerformance, ModelUsage};
use super::stats::{GroupingStats, StatsReport};
use super::types::{AssistantContentBlock, AssistantMessage, DisplayMessage, GroupedMessage, Message};

/// Display log together with counters describing how it was built.
#[derive(Debug, Clone)]
pub struct GroupingResult {
    pub messages: Vec<DisplayMessage>,
    pub stats: GroupingStats,
}

impl GroupingResult {
    /// Statistics plus usage and performance folded over every group block.
    pub fn report(&self) -> StatsReport {
        let blocks: Vec<&AssistantContentBlock> = self
            .messages
            .iter()
            .filter_map(DisplayMessage::as_group)
            .flat_map(|group| group.children.iter())
            .collect();

        StatsReport {
            stats: self.stats.clone(),
            usage: ModelUsage::aggregate(blocks.iter().filter_map(|b| b.usage.as_ref())),
            performance: ModelPerformance::aggregate(
                blocks.iter().filter_map(|b| b.performance.as_ref()),
            ),
        }
    }
}

/// Rebuild the display log from a flat message log.
///
/// Never fails. An empty log yields an empty display log.
pub fn group_messages(messages: &[Message]) -> Vec<DisplayMessage> {
    group_messages_with_stats(messages).messages
}

/// Same as [`group_messages`], also returning grouping statistics.
pub fn group_messages_with_stats(messages: &[Message]) -> GroupingResult {
    let index = MessageIndex::build(messages);
    let mut visited = VisitedTracker::default();
    let mut output: Vec<DisplayMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        match message {
            Message::User(_) | Message::System(_) => output.push(message.clone().into()),
            Message::Tool(tool) => {
                if !visited.is_tool_consumed(&tool.envelope.id) {
                    output.push(message.clone().into());
                }
            }
            Message::Assistant(assistant) => {
                if visited.is_assistant_consumed(&assistant.envelope.id) {
                    continue;
                }
                if !assistant.has_tool_calls() {
                    visited.consume_assistant(&assistant.envelope.id);
                    output.push(message.clone().into());
                    continue;
                }
                let children = resolve_chain(assistant, &index, &mut visited);
                output.push(DisplayMessage::Group(assemble_group(assistant, children)));
            }
        }
    }

    let stats = GroupingStats::from_output(messages.len(), &output);
    tracing::debug!(
        input = stats.input_messages,
        output = stats.output_messages,
        groups = stats.groups,
        child_blocks = stats.child_blocks,
        orphaned_tool_results = stats.orphaned_tool_results,
        pending_tool_calls = stats.pending_tool_calls,
        "Grouped message log"
    );

    GroupingResult {
        messages: output,
        stats,
    }
}

fn assemble_group(head: &AssistantMessage, children: Vec<AssistantContentBlock>) -> GroupedMessage {
    let usage = ModelUsage::aggregate(children.iter().filter_map(|c| c.usage.as_ref()));
    let performance =
        ModelPerformance::aggregate(children.iter().filter_map(|c| c.performance.as_ref()));

    tracing::trace!(
        group_id = %head.envelope.id,
        children = children.len(),
        has_usage = usage.is_some(),
        "Assembled group"
    );

    GroupedMessage {
        envelope: head.envelope.clone(),
        content: String::new(),
        children,
        usage,
        performance,
    }
}
