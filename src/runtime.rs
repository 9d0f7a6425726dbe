//! Runtime that drives the state machine against real collaborators
//!
//! The executor performs the effects requested by each transition (gateway
//! calls, tool execution, appends) and feeds the outcomes back as events.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{AgentLoop, LoopOptions};
pub use traits::*;

use crate::conversation::{Conversation, ConversationError};
use crate::llm::LlmError;
use crate::state_machine::{TerminationReason, TransitionError};
use thiserror::Error;

/// Failures that abort a run
///
/// Tool failures never show up here; they are fed back to the model.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Model gateway unavailable: {0}")]
    GatewayUnavailable(#[source] LlmError),
    #[error("Loop exhausted after {iterations} iterations without a final answer")]
    LoopExhausted { iterations: u32 },
    #[error("Run cancelled")]
    Cancelled,
    #[error("Loop stalled in state {0} with no pending work")]
    Stalled(&'static str),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// Result of one completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub reason: TerminationReason,
    pub iterations: u32,
    pub conversation: Conversation,
}

impl RunOutcome {
    /// Text of the final answer, if the model produced one
    pub fn final_answer(&self) -> Option<&str> {
        match &self.reason {
            TerminationReason::FinalAnswer { text } => Some(text),
            _ => None,
        }
    }

    pub fn stopped_by_condition(&self) -> bool {
        matches!(self.reason, TerminationReason::StopCondition { .. })
    }
}

/// Result of an interactive session made of several runs
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub conversation: Conversation,
    pub turns: u32,
    pub last_reason: Option<TerminationReason>,
}

impl SessionOutcome {
    /// Whether the session ended through the stop condition rather than input running out
    pub fn completed(&self) -> bool {
        matches!(
            self.last_reason,
            Some(TerminationReason::StopCondition { .. })
        )
    }
}
