//! Common types for LLM interactions

use crate::conversation::{Message, ToolCall};

/// LLM request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System directive, sent ahead of the conversation
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
}

/// Tool definition
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub end_turn: bool,
    pub usage: Usage,
}

impl LlmResponse {
    /// Final answer with no tool calls
    #[cfg(test)]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: vec![],
            end_turn: true,
            usage: Usage::default(),
        }
    }

    /// Response requesting tool calls
    #[cfg(test)]
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            end_turn: false,
            usage: Usage::default(),
        }
    }

    /// Check if response contains any tool use requests
    pub fn has_tool_use(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into the assistant message appended to the conversation
    pub fn into_message(self) -> Message {
        Message::Assistant {
            content: self.content,
            tool_calls: self.tool_calls,
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
