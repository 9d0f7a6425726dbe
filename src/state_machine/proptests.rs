//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::conversation::{Conversation, ConversationError, Message, ToolCall};
use crate::tools::{SignalKind, ToolOutput, ToolSignal};
use proptest::prelude::*;
use serde_json::json;
use std::path::PathBuf;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(max_iterations: u32) -> LoopContext {
    LoopContext::new("prop-run")
        .with_max_iterations(max_iterations)
        .with_stop_condition(StopCondition::OnSignal(SignalKind::DocumentSaved))
}

fn calls(n: usize) -> Vec<ToolCall> {
    (0..n)
        .map(|i| ToolCall::new(format!("call_{i}"), "add", json!({"a": i, "b": 1})))
        .collect()
}

fn result_for(call: &ToolCall, is_error: bool, saved: bool) -> ToolResult {
    let mut result = ToolResult::success(&call.id, ToolOutput::success("ok"));
    result.is_error = is_error;
    if saved {
        result.signal = Some(ToolSignal::DocumentSaved {
            path: PathBuf::from("notes.txt"),
        });
    }
    result
}

fn tool_result_appends(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::AppendMessage {
                message: Message::ToolResult { tool_use_id, .. },
            } => Some(tool_use_id.clone()),
            _ => None,
        })
        .collect()
}

/// Apply the append effects to a real history, the way the executor does
fn apply_appends(conversation: &mut Conversation, effects: &[Effect]) -> Result<(), ConversationError> {
    for effect in effects {
        if let Effect::AppendMessage { message } = effect {
            conversation.push(message.clone())?;
        }
    }
    Ok(())
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// One scripted model turn: how many calls, and per call (error, saved)
fn arb_turn() -> impl Strategy<Value = Vec<(bool, bool)>> {
    proptest::collection::vec((any::<bool>(), prop::bool::weighted(0.1)), 0..4)
}

fn arb_script() -> impl Strategy<Value = Vec<Vec<(bool, bool)>>> {
    proptest::collection::vec(arb_turn(), 1..12)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Every requested call yields exactly one appended tool result, in request order
    #[test]
    fn prop_one_result_per_call(n in 1usize..6, rotate in 0usize..6, errors in proptest::collection::vec(any::<bool>(), 6)) {
        let context = test_context(10);
        let requested = calls(n);
        let state = LoopState::AwaitingModel { iteration: 1, outstanding: requested.clone() };

        let mut results: Vec<ToolResult> = requested
            .iter()
            .zip(&errors)
            .map(|(c, e)| result_for(c, *e, false))
            .collect();
        results.rotate_left(rotate % n);

        let outcome = transition(&state, &context, Event::ToolsCompleted { results }).unwrap();
        let appended = tool_result_appends(&outcome.effects);
        let expected: Vec<String> = requested.iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(appended, expected);
    }

    /// Termination happens iff the reply has no calls, the stop condition fires,
    /// or the guard trips
    #[test]
    fn prop_termination_iff_condition(script in arb_script(), max_iterations in 1u32..8) {
        let context = test_context(max_iterations);
        let mut state = transition(
            &LoopState::default(),
            &context,
            Event::Start { has_user_message: true, pending_calls: vec![] },
        ).unwrap().new_state;

        for turn in &script {
            if state.is_terminated() {
                break;
            }
            let requested = calls(turn.len());
            let after_model = transition(&state, &context, Event::ModelResponded {
                message: Message::assistant("", requested.clone()),
            }).unwrap();

            if requested.is_empty() {
                let is_final = matches!(
                    &after_model.new_state,
                    LoopState::Terminated { reason: TerminationReason::FinalAnswer { .. }, .. }
                );
                prop_assert!(is_final);
                state = after_model.new_state;
                break;
            }
            prop_assert!(!after_model.new_state.is_terminated());

            let results: Vec<ToolResult> = requested
                .iter()
                .zip(turn)
                .map(|(c, (err, saved))| result_for(c, *err, *saved))
                .collect();
            let any_saved = turn.iter().any(|(_, saved)| *saved);
            let iteration = after_model.new_state.iterations();

            let after_tools = transition(
                &after_model.new_state,
                &context,
                Event::ToolsCompleted { results },
            ).unwrap();

            match &after_tools.new_state {
                LoopState::Terminated { reason: TerminationReason::StopCondition { .. }, .. } => {
                    prop_assert!(any_saved);
                }
                LoopState::Terminated { reason: TerminationReason::Exhausted, .. } => {
                    prop_assert!(!any_saved);
                    prop_assert!(iteration >= max_iterations);
                }
                LoopState::Terminated { reason: TerminationReason::FinalAnswer { .. }, .. } => {
                    prop_assert!(false, "tool results cannot produce a final answer");
                }
                LoopState::AwaitingModel { outstanding, .. } => {
                    prop_assert!(!any_saved);
                    prop_assert!(outstanding.is_empty());
                    prop_assert!(after_tools.effects.contains(&Effect::RequestModel));
                }
            }
            state = after_tools.new_state;
        }

        prop_assert!(state.iterations() <= max_iterations);
    }

    /// Ids that restart at call_0 every turn never break the history
    #[test]
    fn prop_reused_call_ids_keep_history_valid(script in arb_script()) {
        let context = LoopContext::new("prop-run").with_max_iterations(50);
        let mut conversation = Conversation::from_messages([Message::user("go")]).unwrap();
        let mut state = transition(
            &LoopState::default(),
            &context,
            Event::Start { has_user_message: true, pending_calls: vec![] },
        ).unwrap().new_state;

        for turn in &script {
            if state.is_terminated() {
                break;
            }
            let requested = calls(turn.len());
            let after_model = transition(&state, &context, Event::ModelResponded {
                message: Message::assistant("", requested.clone()),
            }).unwrap();
            prop_assert_eq!(apply_appends(&mut conversation, &after_model.effects), Ok(()));
            prop_assert_eq!(conversation.pending_tool_calls(), requested.clone());
            state = after_model.new_state;
            if requested.is_empty() {
                break;
            }

            let results: Vec<ToolResult> = requested
                .iter()
                .zip(turn)
                .map(|(c, (err, _))| result_for(c, *err, false))
                .collect();
            let after_tools = transition(&state, &context, Event::ToolsCompleted { results }).unwrap();
            prop_assert_eq!(apply_appends(&mut conversation, &after_tools.effects), Ok(()));
            prop_assert!(conversation.pending_tool_calls().is_empty());
            state = after_tools.new_state;
        }
    }

    /// The number of model requests never exceeds the configured bound
    #[test]
    fn prop_model_requests_bounded(max_iterations in 1u32..10, turns in 1usize..30) {
        let context = LoopContext::new("prop-run").with_max_iterations(max_iterations);
        let mut state = LoopState::default();
        let mut requests = 0u32;

        let outcome = transition(&state, &context, Event::Start { has_user_message: true, pending_calls: vec![] }).unwrap();
        requests += u32::from(outcome.effects.contains(&Effect::RequestModel));
        state = outcome.new_state;

        for _ in 0..turns {
            if state.is_terminated() {
                break;
            }
            let requested = calls(1);
            state = transition(&state, &context, Event::ModelResponded {
                message: Message::assistant("", requested.clone()),
            }).unwrap().new_state;
            let outcome = transition(&state, &context, Event::ToolsCompleted {
                results: vec![result_for(&requested[0], false, false)],
            }).unwrap();
            requests += u32::from(outcome.effects.contains(&Effect::RequestModel));
            state = outcome.new_state;
        }

        prop_assert!(requests <= max_iterations);
    }

    /// A terminated loop accepts no further events
    #[test]
    fn prop_terminated_is_absorbing(text in "[a-zA-Z0-9 ]{0,30}", iterations in 0u32..50) {
        let state = LoopState::Terminated {
            reason: TerminationReason::FinalAnswer { text: text.clone() },
            iterations,
        };
        let context = test_context(10);
        for event in [
            Event::UserInput { text },
            Event::InputUnavailable,
            Event::ModelResponded { message: Message::assistant("", vec![]) },
            Event::ToolsCompleted { results: vec![] },
        ] {
            prop_assert_eq!(transition(&state, &context, event).err(), Some(TransitionError::Terminated));
        }
    }
}
