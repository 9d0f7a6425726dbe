//! Pure state transition function
//!
//! Given the same state, context and event it always produces the same next
//! state and effects, with no I/O.

use super::{Effect, Event, LoopContext, LoopState, TerminationReason, ToolResult};
use crate::conversation::{Message, ToolCall};
use std::collections::HashMap;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: LoopState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: LoopState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Run already terminated")]
    Terminated,
    #[error("Tool results do not match outstanding calls: expected {expected:?}, got {got:?}")]
    ResultMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &LoopState,
    context: &LoopContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let (iteration, outstanding) = match state {
        LoopState::Terminated { .. } => return Err(TransitionError::Terminated),
        LoopState::AwaitingModel {
            iteration,
            outstanding,
        } => (*iteration, outstanding),
    };

    match event {
        // Seeded conversations may end with calls that never got results
        Event::Start { pending_calls, .. } if outstanding.is_empty() && !pending_calls.is_empty() => {
            Ok(TransitionResult::new(LoopState::AwaitingModel {
                iteration,
                outstanding: pending_calls.clone(),
            })
            .with_effect(Effect::execute_tools(pending_calls)))
        }

        Event::Start {
            has_user_message, ..
        } if outstanding.is_empty() => {
            if has_user_message {
                Ok(request_model(iteration, context))
            } else {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::RequestInput))
            }
        }

        Event::UserInput { text } if outstanding.is_empty() => {
            Ok(request_model(iteration, context).prepend(Effect::append(Message::user(text))))
        }

        // Missing input still burns an iteration so an empty run cannot spin forever
        Event::InputUnavailable if outstanding.is_empty() => {
            let iteration = iteration + 1;
            if iteration >= context.max_iterations {
                Ok(exhausted(iteration))
            } else {
                Ok(TransitionResult::new(LoopState::AwaitingModel {
                    iteration,
                    outstanding: vec![],
                })
                .with_effect(Effect::RequestInput))
            }
        }

        Event::ModelResponded { message }
            if outstanding.is_empty() && matches!(message, Message::Assistant { .. }) =>
        {
            let tool_calls = message.tool_calls().to_vec();
            if tool_calls.is_empty() {
                let text = message.content().to_string();
                Ok(TransitionResult::new(LoopState::Terminated {
                    reason: TerminationReason::FinalAnswer { text },
                    iterations: iteration,
                })
                .with_effect(Effect::append(message)))
            } else {
                Ok(TransitionResult::new(LoopState::AwaitingModel {
                    iteration,
                    outstanding: tool_calls.clone(),
                })
                .with_effect(Effect::append(message))
                .with_effect(Effect::execute_tools(tool_calls)))
            }
        }

        Event::ToolsCompleted { results } if !outstanding.is_empty() => {
            let ordered = order_results(outstanding, results)?;

            let stop_id = ordered
                .iter()
                .find(|r| context.stop_condition.fires(r.signal.as_ref()))
                .map(|r| r.tool_use_id.clone());

            // Every call gets its result appended, even when the stop condition fires
            let appends = ordered.iter().map(|r| Effect::append(r.to_message()));

            match stop_id {
                Some(tool_use_id) => Ok(TransitionResult::new(LoopState::Terminated {
                    reason: TerminationReason::StopCondition { tool_use_id },
                    iterations: iteration,
                })
                .with_effects(appends)),
                None => Ok(request_model(iteration, context).prepend_all(appends)),
            }
        }

        event => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} (outstanding calls: {}) with event {:?}",
            state.name(),
            outstanding.len(),
            event
        ))),
    }
}

impl TransitionResult {
    fn prepend(mut self, effect: Effect) -> Self {
        self.effects.insert(0, effect);
        self
    }

    fn prepend_all(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        let mut all: Vec<Effect> = effects.into_iter().collect();
        all.append(&mut self.effects);
        self.effects = all;
        self
    }
}

/// Request the model unless the iteration guard trips
fn request_model(iteration: u32, context: &LoopContext) -> TransitionResult {
    if iteration >= context.max_iterations {
        return exhausted(iteration);
    }
    TransitionResult::new(LoopState::AwaitingModel {
        iteration: iteration + 1,
        outstanding: vec![],
    })
    .with_effect(Effect::RequestModel)
}

fn exhausted(iterations: u32) -> TransitionResult {
    TransitionResult::new(LoopState::Terminated {
        reason: TerminationReason::Exhausted,
        iterations,
    })
}

/// Match results to outstanding calls one-to-one, in request order
fn order_results(
    outstanding: &[ToolCall],
    results: Vec<ToolResult>,
) -> Result<Vec<ToolResult>, TransitionError> {
    let mismatch = |results: &[ToolResult]| TransitionError::ResultMismatch {
        expected: outstanding.iter().map(|c| c.id.clone()).collect(),
        got: results.iter().map(|r| r.tool_use_id.clone()).collect(),
    };

    if results.len() != outstanding.len() {
        return Err(mismatch(&results));
    }

    let mut by_id: HashMap<String, ToolResult> = HashMap::with_capacity(results.len());
    for result in &results {
        if by_id
            .insert(result.tool_use_id.clone(), result.clone())
            .is_some()
        {
            return Err(mismatch(&results));
        }
    }

    outstanding
        .iter()
        .map(|call| by_id.remove(&call.id).ok_or_else(|| mismatch(&results)))
        .collect()
}
