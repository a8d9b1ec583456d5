//! Conversation message types.
//!
//! Input messages arrive as a flat, chronologically ordered log. The grouping
//! pipeline turns them into display messages, where every tool-invoking
//! assistant turn is folded into a single `group` node. Both enums are tagged
//! by `role` on the wire.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::metrics::{ModelPerformance, ModelUsage};

// ============================================================================
// ROLES
// ============================================================================

/// Conversation roles, including the synthetic `group` role of the display log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
    Group,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Group => "group",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ENVELOPE
// ============================================================================

/// Fields shared by every message variant.
///
/// Keys the engine does not interpret (timestamps, topic ids, session ids)
/// are kept in `extra` in their original order, so pass-through messages
/// serialize back to the shape they were read with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: String,
    /// Raw `parentId`; see [`Envelope::parent_id`]
    #[serde(
        rename = "parentId",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<JsonValue>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub meta: Option<JsonValue>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Envelope {
    /// Message this one continues from. For follow-up assistants this is a
    /// tool message id. A `null` or non-string `parentId` counts as none.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().and_then(JsonValue::as_str)
    }
}

/// Keeps an explicit `null` apart from a missing key: missing stays `None`
/// through `#[serde(default)]`, `null` is handed to `T`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// TOOL PAYLOADS
// ============================================================================

/// Tool invocation request embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatToolPayload {
    /// Tool call id, matched against `tool_call_id` of tool messages
    pub id: String,
    /// Plugin / tool identifier
    pub identifier: String,
    pub api_name: String,
    /// Raw JSON arguments as produced by the model
    #[serde(default)]
    pub arguments: String,
    /// Tool kind ("default", "builtin", "mcp", ...)
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
}

fn default_tool_type() -> String {
    "default".to_string()
}

/// Result attached to a tool call once its tool message is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolResult {
    /// Id of the tool message carrying the result
    pub id: String,
    pub content: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub state: Option<JsonValue>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
}

impl From<&ToolMessage> for ChatToolResult {
    fn from(tool: &ToolMessage) -> Self {
        Self {
            id: tool.envelope.id.clone(),
            content: tool.content.clone(),
            state: tool.plugin_state.clone(),
            error: tool.plugin_error.clone(),
        }
    }
}

/// Tool call with its result, if one has arrived.
///
/// A missing `result` means the tool is still executing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatToolPayloadWithResult {
    #[serde(flatten)]
    pub payload: ChatToolPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ChatToolResult>,
}

impl ChatToolPayloadWithResult {
    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }
}

// ============================================================================
// ATTACHMENTS
// ============================================================================

// Attachments and reasoning are carried from the input to the display log
// without interpretation. They stay raw JSON so that every key, every `null`
// and every number survives, and a malformed item never fails the log.

fn str_field<'a>(value: &'a JsonValue, key: &str) -> Option<&'a str> {
    value.get(key).and_then(JsonValue::as_str)
}

/// Image attached to an assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatImageItem(pub JsonValue);

impl ChatImageItem {
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }

    pub fn url(&self) -> Option<&str> {
        str_field(&self.0, "url")
    }

    pub fn alt(&self) -> Option<&str> {
        str_field(&self.0, "alt")
    }
}

/// File attached to an assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatFileItem(pub JsonValue);

impl ChatFileItem {
    pub fn id(&self) -> Option<&str> {
        str_field(&self.0, "id")
    }

    pub fn url(&self) -> Option<&str> {
        str_field(&self.0, "url")
    }

    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    /// Size in bytes
    pub fn size(&self) -> Option<f64> {
        self.0.get("size").and_then(JsonValue::as_f64)
    }

    pub fn file_type(&self) -> Option<&str> {
        str_field(&self.0, "fileType")
    }
}

/// Reasoning trace emitted alongside an assistant turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelReasoning(pub JsonValue);

impl ModelReasoning {
    pub fn content(&self) -> Option<&str> {
        str_field(&self.0, "content")
    }

    pub fn signature(&self) -> Option<&str> {
        str_field(&self.0, "signature")
    }

    /// Milliseconds spent reasoning
    pub fn duration(&self) -> Option<f64> {
        self.0.get("duration").and_then(JsonValue::as_f64)
    }
}

// ============================================================================
// INPUT MESSAGES
// ============================================================================

/// User or system message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlainMessage {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub content: String,
}

/// Single model call, possibly issuing tool calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatToolPayload>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_list: Option<Vec<ChatImageItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_list: Option<Vec<ChatFileItem>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ModelReasoning>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
    /// Token, cost and latency numbers for this single call, kept as read.
    /// Only group children see it split into `usage` and `performance`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
}

impl AssistantMessage {
    /// True when the turn issued at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        self.tools.as_ref().is_some_and(|tools| !tools.is_empty())
    }
}

/// Result of a single tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMessage {
    #[serde(flatten)]
    pub envelope: Envelope,
    #[serde(rename = "tool_call_id")]
    pub tool_call_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub plugin_state: Option<JsonValue>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub plugin_error: Option<JsonValue>,
}

/// A message of the flat input log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User(PlainMessage),
    System(PlainMessage),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
}

impl Message {
    pub fn envelope(&self) -> &Envelope {
        match self {
            Self::User(m) | Self::System(m) => &m.envelope,
            Self::Assistant(m) => &m.envelope,
            Self::Tool(m) => &m.envelope,
        }
    }

    pub fn id(&self) -> &str {
        &self.envelope().id
    }

    pub fn role(&self) -> ChatRole {
        match self {
            Self::User(_) => ChatRole::User,
            Self::System(_) => ChatRole::System,
            Self::Assistant(_) => ChatRole::Assistant,
            Self::Tool(_) => ChatRole::Tool,
        }
    }
}

// ============================================================================
// DISPLAY MESSAGES
// ============================================================================

/// One resolved assistant turn inside a group.
///
/// Empty lists are normalized to `None` so that "nothing attached" has a
/// single representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantContentBlock {
    /// Id of the assistant message this block was built from
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ChatToolPayloadWithResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_list: Option<Vec<ChatImageItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_list: Option<Vec<ChatFileItem>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ModelReasoning>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<ModelPerformance>,
}

/// Collapsed assistant turn: the tool-invoking head plus every chained
/// follow-up, with metrics aggregated across all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedMessage {
    /// Envelope of the head assistant message
    #[serde(flatten)]
    pub envelope: Envelope,
    /// Always empty; text lives in the children
    #[serde(default)]
    pub content: String,
    pub children: Vec<AssistantContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ModelUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<ModelPerformance>,
}

/// A message of the grouped display log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum DisplayMessage {
    User(PlainMessage),
    System(PlainMessage),
    Assistant(AssistantMessage),
    Tool(ToolMessage),
    Group(GroupedMessage),
}

impl DisplayMessage {
    pub fn envelope(&self) -> &Envelope {
        match self {
            Self::User(m) | Self::System(m) => &m.envelope,
            Self::Assistant(m) => &m.envelope,
            Self::Tool(m) => &m.envelope,
            Self::Group(m) => &m.envelope,
        }
    }

    pub fn id(&self) -> &str {
        &self.envelope().id
    }

    pub fn role(&self) -> ChatRole {
        match self {
            Self::User(_) => ChatRole::User,
            Self::System(_) => ChatRole::System,
            Self::Assistant(_) => ChatRole::Assistant,
            Self::Tool(_) => ChatRole::Tool,
            Self::Group(_) => ChatRole::Group,
        }
    }

    pub fn as_group(&self) -> Option<&GroupedMessage> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }
}

impl From<Message> for DisplayMessage {
    fn from(message: Message) -> Self {
        match message {
            Message::User(m) => Self::User(m),
            Message::System(m) => Self::System(m),
            Message::Assistant(m) => Self::Assistant(m),
            Message::Tool(m) => Self::Tool(m),
        }
    }
}
