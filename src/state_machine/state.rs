//! Loop state types

use crate::conversation::ToolCall;
use crate::tools::{SignalKind, ToolSignal};
use serde::Serialize;

/// Default bound on model requests per run
pub const DEFAULT_MAX_ITERATIONS: u32 = 25;

/// Loop state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopState {
    /// The next step is a model request, once every outstanding call has a result
    AwaitingModel {
        /// Model requests issued so far, plus failed input attempts
        iteration: u32,
        /// Calls from the last assistant message still waiting for results
        outstanding: Vec<ToolCall>,
    },

    /// No further model or tool cycles
    Terminated {
        reason: TerminationReason,
        iterations: u32,
    },
}

impl Default for LoopState {
    fn default() -> Self {
        LoopState::AwaitingModel {
            iteration: 0,
            outstanding: vec![],
        }
    }
}

impl LoopState {
    #[cfg(test)]
    pub fn is_terminated(&self) -> bool {
        matches!(self, LoopState::Terminated { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoopState::AwaitingModel { .. } => "awaiting_model",
            LoopState::Terminated { .. } => "terminated",
        }
    }

    pub fn iterations(&self) -> u32 {
        match self {
            LoopState::AwaitingModel { iteration, .. } => *iteration,
            LoopState::Terminated { iterations, .. } => *iterations,
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model replied without requesting tools
    FinalAnswer { text: String },
    /// A tool result satisfied the stop condition
    StopCondition { tool_use_id: String },
    /// The iteration guard tripped
    Exhausted,
}

/// Auxiliary termination predicate, evaluated after each tool result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopCondition {
    /// Only the model declining further tool use ends the run
    #[default]
    Never,
    /// End the run as soon as a tool reports this signal
    OnSignal(SignalKind),
}

impl StopCondition {
    pub fn fires(self, signal: Option<&ToolSignal>) -> bool {
        match (self, signal) {
            (StopCondition::OnSignal(kind), Some(signal)) => signal.kind() == kind,
            _ => false,
        }
    }
}

/// Immutable configuration of one run
#[derive(Debug, Clone)]
pub struct LoopContext {
    pub run_id: String,
    pub max_iterations: u32,
    pub stop_condition: StopCondition,
}

impl LoopContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stop_condition: StopCondition::Never,
        }
    }

    #[cfg(test)]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_stop_condition(mut self, stop_condition: StopCondition) -> Self {
        self.stop_condition = stop_condition;
        self
    }
}
