//! Lookup tables over a flat message log.
//!
//! Built once per grouping run. Lookups that miss simply return nothing; the
//! index never rejects a log.

use rustc_hash::FxHashMap;

use super::types::{AssistantMessage, Message, ToolMessage};

/// Borrowing index over one message log.
#[derive(Debug, Default)]
pub struct MessageIndex<'a> {
    /// `tool_call_id` -> tool message (last write wins on duplicates)
    tool_by_call_id: FxHashMap<&'a str, &'a ToolMessage>,
    /// message id -> message
    by_id: FxHashMap<&'a str, &'a Message>,
    /// tool message id -> assistants continuing from it, in log order
    follow_ups: FxHashMap<&'a str, Vec<&'a AssistantMessage>>,
}

impl<'a> MessageIndex<'a> {
    pub fn build(messages: &'a [Message]) -> Self {
        let mut index = Self::default();

        for message in messages {
            index.by_id.insert(message.id(), message);
            if let Message::Tool(tool) = message
                && index
                    .tool_by_call_id
                    .insert(tool.tool_call_id.as_str(), tool)
                    .is_some()
            {
                tracing::trace!(
                    tool_call_id = %tool.tool_call_id,
                    message_id = %tool.envelope.id,
                    "Duplicate tool_call_id, keeping the later tool message"
                );
            }
        }

        // Second scan so a parent is found regardless of where it sits in the log
        for message in messages {
            let Message::Assistant(assistant) = message else {
                continue;
            };
            let Some(parent_id) = assistant.envelope.parent_id() else {
                continue;
            };
            if let Some(&parent) = index.by_id.get(parent_id)
                && let Message::Tool(parent) = parent
            {
                index
                    .follow_ups
                    .entry(parent.envelope.id.as_str())
                    .or_default()
                    .push(assistant);
            }
        }

        index
    }

    /// Tool message answering `tool_call_id`, if any.
    pub fn tool_result(&self, tool_call_id: &str) -> Option<&'a ToolMessage> {
        self.tool_by_call_id.get(tool_call_id).copied()
    }

    pub fn message(&self, id: &str) -> Option<&'a Message> {
        self.by_id.get(id).copied()
    }

    /// Assistants whose `parentId` is the given tool message, in log order.
    pub fn follow_ups(&self, tool_message_id: &str) -> &[&'a AssistantMessage] {
        self.follow_ups
            .get(tool_message_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log(value: serde_json::Value) -> Vec<Message> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_index_empty_log() {
        let messages = Vec::new();
        let index = MessageIndex::build(&messages);
        assert!(index.tool_result("call-1").is_none());
        assert!(index.message("msg-1").is_none());
        assert!(index.follow_ups("msg-1").is_empty());
    }

    #[test]
    fn test_index_links_tools_and_follow_ups() {
        let messages = log(json!([
            {"id": "a1", "role": "assistant", "content": "", "tools": [
                {"id": "call-1", "identifier": "t", "apiName": "run", "arguments": "{}", "type": "default"}
            ]},
            {"id": "t1", "role": "tool", "tool_call_id": "call-1", "content": "r1"},
            {"id": "a2", "role": "assistant", "content": "first", "parentId": "t1"},
            {"id": "a3", "role": "assistant", "content": "second", "parentId": "t1"},
            {"id": "a4", "role": "assistant", "content": "after user", "parentId": "a1"}
        ]));

        let index = MessageIndex::build(&messages);

        assert_eq!(index.tool_result("call-1").unwrap().envelope.id, "t1");
        assert_eq!(index.message("a4").unwrap().id(), "a4");

        let follow_ups: Vec<&str> = index
            .follow_ups("t1")
            .iter()
            .map(|a| a.envelope.id.as_str())
            .collect();
        assert_eq!(follow_ups, vec!["a2", "a3"]);

        // parent is an assistant, not a tool message
        assert!(index.follow_ups("a1").is_empty());
    }

    #[test]
    fn test_index_duplicate_tool_call_id_last_wins() {
        let messages = log(json!([
            {"id": "t1", "role": "tool", "tool_call_id": "call-1", "content": "first"},
            {"id": "t2", "role": "tool", "tool_call_id": "call-1", "content": "retry"}
        ]));

        let index = MessageIndex::build(&messages);
        assert_eq!(index.tool_result("call-1").unwrap().content, "retry");
    }

    #[test]
    fn test_index_unknown_parent_is_ignored() {
        let messages = log(json!([
            {"id": "a1", "role": "assistant", "content": "x", "parentId": "missing"}
        ]));

        let index = MessageIndex::build(&messages);
        assert!(index.follow_ups("missing").is_empty());
    }
}
