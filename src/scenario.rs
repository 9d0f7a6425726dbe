//! The two shipped scenarios and what distinguishes them

use crate::state_machine::StopCondition;
use crate::tools::{RegistryError, SignalKind, ToolRegistry};

/// Prompt used when the calculator is started without one
pub const DEFAULT_CALCULATOR_PROMPT: &str = "Add 40 and 12 and subtract 5 from the answer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// One question in, one answer out, arithmetic tools
    Calculator,
    /// Interactive drafting session, ends once the document is saved
    Drafter,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Scenario::Calculator => "calculator",
            Scenario::Drafter => "drafter",
        }
    }

    pub fn registry(self) -> Result<ToolRegistry, RegistryError> {
        match self {
            Scenario::Calculator => ToolRegistry::calculator(),
            Scenario::Drafter => ToolRegistry::drafter(),
        }
    }

    pub fn stop_condition(self) -> StopCondition {
        match self {
            Scenario::Calculator => StopCondition::Never,
            Scenario::Drafter => StopCondition::OnSignal(SignalKind::DocumentSaved),
        }
    }

    pub fn input_prompt(self, first_turn: bool) -> &'static str {
        match (self, first_turn) {
            (Scenario::Calculator, _) => "What would you like to calculate?",
            (Scenario::Drafter, true) => {
                "I'm ready to help you update a document. What would you like to create?"
            }
            (Scenario::Drafter, false) => "What would you like to do with the document?",
        }
    }
}
