//! Grouping statistics.

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::metrics::{ModelPerformance, ModelUsage};
use super::types::DisplayMessage;

/// Counters describing one grouping run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingStats {
    pub input_messages: usize,
    pub output_messages: usize,
    pub groups: usize,
    /// Assistant turns folded into groups, heads included
    pub child_blocks: usize,
    /// Distinct tool messages attached as a tool call result
    pub absorbed_tool_results: usize,
    /// Tool messages left standalone in the display log
    pub orphaned_tool_results: usize,
    /// Tool calls inside groups that have no result yet
    pub pending_tool_calls: usize,
}

impl GroupingStats {
    pub fn from_output(input_messages: usize, output: &[DisplayMessage]) -> Self {
        let mut stats = Self {
            input_messages,
            output_messages: output.len(),
            ..Default::default()
        };
        let mut absorbed = FxHashSet::default();

        for message in output {
            match message {
                DisplayMessage::Tool(_) => stats.orphaned_tool_results += 1,
                DisplayMessage::Group(group) => {
                    stats.groups += 1;
                    stats.child_blocks += group.children.len();
                    for tool in group.children.iter().filter_map(|c| c.tools.as_ref()).flatten() {
                        match &tool.result {
                            Some(result) => {
                                absorbed.insert(result.id.as_str());
                            }
                            None => stats.pending_tool_calls += 1,
                        }
                    }
                }
                _ => {}
            }
        }

        stats.absorbed_tool_results = absorbed.len();
        stats
    }
}

/// Output of the `stats` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: GroupingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<ModelPerformance>,
}
