//! Wire types for the agent's newline-delimited event stream

use serde::{Deserialize, Deserializer, Serialize};

/// Event kind carried in the `type` field of every line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    System,
    #[serde(alias = "user")]
    Human,
    Assistant,
    Result,
}

/// One decoded line of agent output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    #[serde(rename = "costUSD", default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub input_tokens: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub output_tokens: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_creation_input_tokens: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub cache_read_input_tokens: Option<u64>,
}

impl TranscriptEntry {
    /// Content blocks of this entry's message; empty for plain-text or missing content
    pub fn blocks(&self) -> &[ContentBlock] {
        match self.message.as_ref().and_then(|m| m.content.as_ref()) {
            Some(MessageContent::Blocks(blocks)) => blocks,
            _ => &[],
        }
    }

    /// Text carried by this entry, if any.
    ///
    /// Plain-string content is returned as-is; block content joins its text
    /// blocks with newlines. `None` when there is no text at all.
    pub fn text(&self) -> Option<String> {
        match self.message.as_ref()?.content.as_ref()? {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Blocks(blocks) => {
                let texts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
                        ContentBlock::Text { .. } => None,
                        ContentBlock::ToolUse { .. }
                        | ContentBlock::ToolResult { .. }
                        | ContentBlock::Other => None,
                    })
                    .collect();
                if texts.is_empty() {
                    None
                } else {
                    Some(texts.join("\n"))
                }
            }
        }
    }

    /// Non-empty model name on this entry's message
    pub fn model(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.model.as_deref())
            .filter(|model| !model.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Message content: either a bare string or an ordered list of typed blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<serde_json::Value>,
    },
    /// Block types the scorer does not care about (images, thinking, ...)
    #[serde(other)]
    Other,
}

/// Token counts may arrive as floats; round them and clamp negatives to zero
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(number.and_then(|n| {
        n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.max(0.0).round() as u64)
        })
    }))
}

/// Flatten a tool result's payload to text
pub(crate) fn tool_result_text(text: Option<&str>, content: Option<&serde_json::Value>) -> String {
    if let Some(text) = text {
        return text.to_string();
    }
    match content {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

/// A tool invocation correlated with its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}
