//! Events that drive the loop

use crate::conversation::{Message, ToolCall};
use crate::tools::{ToolError, ToolOutput, ToolSignal};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Run begins on a (possibly seeded) conversation
    Start {
        has_user_message: bool,
        /// Calls in the seed that still lack a result
        pending_calls: Vec<ToolCall>,
    },

    // Input events
    UserInput {
        text: String,
    },
    InputUnavailable,

    // Model events
    /// Assistant message returned by the gateway
    ModelResponded {
        message: Message,
    },

    // Tool events
    ToolsCompleted {
        results: Vec<ToolResult>,
    },
}

/// Outcome of one tool call, ready to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub output: String,
    pub is_error: bool,
    pub signal: Option<ToolSignal>,
}

impl ToolResult {
    pub fn success(tool_use_id: impl Into<String>, output: ToolOutput) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output: output.output,
            is_error: false,
            signal: output.signal,
        }
    }

    pub fn error(tool_use_id: impl Into<String>, error: &ToolError) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output: error.model_text(),
            is_error: true,
            signal: None,
        }
    }

    pub fn to_message(&self) -> Message {
        Message::tool_result(&self.tool_use_id, &self.output, self.is_error)
    }
}
