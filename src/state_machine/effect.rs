//! Effects produced by state transitions

use crate::conversation::{Message, ToolCall};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation and show it to the sink
    AppendMessage { message: Message },

    /// Ask the input source for a user message
    RequestInput,

    /// Send the conversation to the model gateway
    RequestModel,

    /// Run every requested call, then report all results at once
    ExecuteTools { calls: Vec<ToolCall> },
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::AppendMessage { message }
    }

    pub fn execute_tools(calls: Vec<ToolCall>) -> Self {
        Effect::ExecuteTools { calls }
    }
}
