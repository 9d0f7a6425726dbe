//! Conversation history shared by the loop, the gateway and the console
//!
//! The history is append-only. Every tool result must answer a still-open
//! call of the most recent assistant message. Call ids only need to be unique
//! within one assistant message; servers may reuse them across turns.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Message {
    #[cfg(test)]
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Message::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::ToolResult { .. } => "tool",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. }
            | Message::ToolResult { content, .. } => content,
        }
    }

    /// Tool calls requested by this message (empty unless assistant)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// Errors raised when an append would break the history invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("tool result references unknown call id: {0}")]
    UnknownToolCallId(String),
    #[error("tool result for call {0} was already recorded")]
    DuplicateToolResult(String),
    #[error("assistant message repeats tool call id: {0}")]
    DuplicateToolCallId(String),
}

/// Ordered, append-only message history
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Ids requested by the most recent assistant message
    latest_ids: HashSet<String>,
    /// Calls of the most recent assistant message still lacking a result
    open_calls: Vec<ToolCall>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a conversation from seed messages, validating each append
    pub fn from_messages(
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<Self, ConversationError> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        match &message {
            Message::Assistant { tool_calls, .. } => {
                let mut seen = HashSet::new();
                for call in tool_calls {
                    if !seen.insert(call.id.as_str()) {
                        return Err(ConversationError::DuplicateToolCallId(call.id.clone()));
                    }
                }
                // A new assistant turn starts a fresh id scope
                self.latest_ids = tool_calls.iter().map(|c| c.id.clone()).collect();
                self.open_calls.clone_from(tool_calls);
            }
            Message::ToolResult { tool_use_id, .. } => {
                match self.open_calls.iter().position(|c| &c.id == tool_use_id) {
                    Some(i) => {
                        self.open_calls.remove(i);
                    }
                    None if self.latest_ids.contains(tool_use_id) => {
                        return Err(ConversationError::DuplicateToolResult(tool_use_id.clone()));
                    }
                    None => {
                        return Err(ConversationError::UnknownToolCallId(tool_use_id.clone()));
                    }
                }
            }
            Message::System { .. } | Message::User { .. } => {}
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_user_message(&self) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(m, Message::User { .. }))
    }

    /// Calls of the latest assistant message that have no result yet, in request order
    pub fn pending_tool_calls(&self) -> Vec<ToolCall> {
        self.open_calls.clone()
    }
}
