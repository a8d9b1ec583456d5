//! Message log loading and display log writing.
//!
//! Two encodings are accepted:
//!
//! ```text
//! json   [ {message}, {message}, ... ]   or   { "messages": [ ... ], ... }
//! jsonl  {message}\n{message}\n...        (blank lines ignored)
//! ```

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::error::DataError;
use crate::core::config::InputFormat;
use crate::core::constants::MESSAGES_KEY;
use crate::domain::conversation::Message;
use crate::utils::file::resolve_log_path;

/// Where a message log is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    Stdin,
    File(PathBuf),
}

impl LogSource {
    /// Build from a CLI argument (`None` or `-` selects stdin)
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match resolve_log_path(arg) {
            Some(path) => Self::File(path),
            None => Self::Stdin,
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Stdin => write!(f, "<stdin>"),
            LogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read and decode a full message log
pub fn read_messages(source: &LogSource, format: InputFormat) -> Result<Vec<Message>, DataError> {
    let content = match source {
        LogSource::Stdin => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
        LogSource::File(path) => fs::read_to_string(path)?,
    };

    let messages = parse_messages(&content, format)?;
    tracing::debug!(
        source = %source,
        format = %format,
        bytes = content.len(),
        messages = messages.len(),
        "Loaded message log"
    );
    Ok(messages)
}

/// Decode a message log held in memory
pub fn parse_messages(content: &str, format: InputFormat) -> Result<Vec<Message>, DataError> {
    match format {
        InputFormat::Json => parse_json(serde_json::from_str(content)?),
        InputFormat::Jsonl => parse_jsonl(content),
        InputFormat::Auto => {
            let trimmed = content.trim_start();
            if trimmed.is_empty() {
                return Ok(Vec::new());
            }
            if trimmed.starts_with('[') {
                return parse_json(serde_json::from_str(content)?);
            }
            // One object is either a wrapper or a lone message; anything else is read line by line
            if trimmed.starts_with('{')
                && let Ok(value @ JsonValue::Object(_)) = serde_json::from_str::<JsonValue>(content)
            {
                if value.get(MESSAGES_KEY).is_some() {
                    return parse_json(value);
                }
                return Ok(vec![serde_json::from_value(value)?]);
            }
            tracing::trace!("Input is not a single JSON document, reading as JSONL");
            parse_jsonl(content)
        }
    }
}

fn parse_json(value: JsonValue) -> Result<Vec<Message>, DataError> {
    let messages = match value {
        JsonValue::Array(_) => value,
        JsonValue::Object(mut map) => match map.remove(MESSAGES_KEY) {
            Some(messages @ JsonValue::Array(_)) => messages,
            Some(other) => return Err(unsupported_shape(&other)),
            None => return Err(unsupported_shape(&JsonValue::Object(map))),
        },
        other => return Err(unsupported_shape(&other)),
    };
    Ok(serde_json::from_value(messages)?)
}

fn parse_jsonl(content: &str) -> Result<Vec<Message>, DataError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| DataError::json_line(i + 1, e)))
        .collect()
}

fn unsupported_shape(value: &JsonValue) -> DataError {
    let found = match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object without a message array",
    };
    DataError::UnsupportedShape {
        key: MESSAGES_KEY,
        found,
    }
}

/// Write `value` as JSON followed by a newline
pub fn write_json<W, T>(mut writer: W, value: &T, pretty: bool) -> Result<(), DataError>
where
    W: Write,
    T: Serialize + ?Sized,
{
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ChatRole;

    const ARRAY_LOG: &str = r#"[
        {"id": "u1", "role": "user", "content": "hi"},
        {"id": "a1", "role": "assistant", "content": "hello", "parentId": "u1"}
    ]"#;

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(Message::id).collect()
    }

    #[test]
    fn test_parse_json_array() {
        let messages = parse_messages(ARRAY_LOG, InputFormat::Json).unwrap();
        assert_eq!(ids(&messages), vec!["u1", "a1"]);
        assert_eq!(messages[1].role(), ChatRole::Assistant);
    }

    #[test]
    fn test_parse_json_wrapper_object() {
        let content = r#"{"topicId": "t-1", "messages": [{"id": "u1", "role": "user", "content": "x"}]}"#;
        for format in [InputFormat::Json, InputFormat::Auto] {
            let messages = parse_messages(content, format).unwrap();
            assert_eq!(ids(&messages), vec!["u1"]);
        }
    }

    #[test]
    fn test_parse_json_unsupported_shape() {
        let err = parse_messages(r#"{"items": []}"#, InputFormat::Json).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedShape { .. }));

        let err = parse_messages(r#"{"messages": "nope"}"#, InputFormat::Json).unwrap_err();
        assert!(err.to_string().ends_with("found string"));
    }

    #[test]
    fn test_parse_jsonl_skips_blank_lines() {
        let content = "{\"id\": \"u1\", \"role\": \"user\", \"content\": \"a\"}\n\n   \n{\"id\": \"u2\", \"role\": \"user\", \"content\": \"b\"}\n";
        let messages = parse_messages(content, InputFormat::Jsonl).unwrap();
        assert_eq!(ids(&messages), vec!["u1", "u2"]);
    }

    #[test]
    fn test_parse_jsonl_reports_line_number() {
        let content = "{\"id\": \"u1\", \"role\": \"user\", \"content\": \"a\"}\n\n{\"id\": \"x\", \"role\": \"narrator\"}\n";
        let err = parse_messages(content, InputFormat::Jsonl).unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().starts_with("Invalid message on line 3"));
    }

    #[test]
    fn test_auto_detection() {
        assert_eq!(parse_messages(ARRAY_LOG, InputFormat::Auto).unwrap().len(), 2);

        // JSONL starts with `{` too but is not one JSON document
        let jsonl = "{\"id\": \"u1\", \"role\": \"user\", \"content\": \"a\"}\n{\"id\": \"u2\", \"role\": \"user\", \"content\": \"b\"}";
        assert_eq!(ids(&parse_messages(jsonl, InputFormat::Auto).unwrap()), vec!["u1", "u2"]);

        let single = "{\n  \"id\": \"u1\",\n  \"role\": \"user\",\n  \"content\": \"a\"\n}";
        assert_eq!(ids(&parse_messages(single, InputFormat::Auto).unwrap()), vec!["u1"]);

        assert!(parse_messages("  \n", InputFormat::Auto).unwrap().is_empty());
    }

    #[test]
    fn test_read_messages_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, ARRAY_LOG).unwrap();

        let source = LogSource::from_arg(Some(path.as_path()));
        assert_eq!(source, LogSource::File(path.clone()));
        let messages = read_messages(&source, InputFormat::Auto).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_read_messages_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = LogSource::File(dir.path().join("missing.json"));
        let err = read_messages(&source, InputFormat::Json).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn test_log_source_from_arg() {
        assert_eq!(LogSource::from_arg(None), LogSource::Stdin);
        assert_eq!(LogSource::from_arg(Some(Path::new("-"))), LogSource::Stdin);
        assert_eq!(LogSource::Stdin.to_string(), "<stdin>");
    }

    #[test]
    fn test_write_json_compact_and_pretty() {
        let value = serde_json::json!({"a": 1});

        let mut compact = Vec::new();
        write_json(&mut compact, &value, false).unwrap();
        assert_eq!(String::from_utf8(compact).unwrap(), "{\"a\":1}\n");

        let mut pretty = Vec::new();
        write_json(&mut pretty, &value, true).unwrap();
        assert_eq!(String::from_utf8(pretty).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
