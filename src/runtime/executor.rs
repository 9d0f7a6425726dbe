//! Tool-call loop executor

use super::traits::{InputSource, LlmClient, NoInput, NullSink, OutputSink, ToolExecutor};
use super::{LoopError, RunOutcome, SessionOutcome};

use crate::conversation::{Conversation, Message, ToolCall};
use crate::llm::{LlmError, LlmRequest};
use crate::scenario::Scenario;
use crate::state_machine::{
    transition, Effect, Event, LoopContext, LoopState, TerminationReason, ToolResult,
};
use crate::system_prompt::build_system_prompt;
use crate::tools::{Session, ToolContext};
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Tunables of the executor that are not part of the state machine
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Upper bound on a single gateway call
    pub llm_timeout: Duration,
    pub max_tokens: Option<u32>,
    /// Run the calls of one assistant message concurrently
    pub parallel_tools: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(120),
            max_tokens: Some(4096),
            parallel_tools: false,
        }
    }
}

/// Drives one conversation through the tool-call resolution loop
pub struct AgentLoop<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    scenario: Scenario,
    context: LoopContext,
    options: LoopOptions,
    llm: L,
    tools: T,
    session: Arc<Session>,
    input: Box<dyn InputSource>,
    sink: Arc<dyn OutputSink>,
    cancel: CancellationToken,
}

impl<L, T> AgentLoop<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub fn new(scenario: Scenario, llm: L, tools: T, session: Arc<Session>) -> Self {
        Self {
            scenario,
            context: LoopContext::new(String::new())
                .with_stop_condition(scenario.stop_condition()),
            options: LoopOptions::default(),
            llm,
            tools,
            session,
            input: Box::new(NoInput),
            sink: Arc::new(NullSink),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_options(mut self, options: LoopOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.context.max_iterations = max_iterations;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the loop until it terminates
    pub async fn run(&mut self, conversation: Conversation) -> Result<RunOutcome, LoopError> {
        self.context.run_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "run",
            run_id = %self.context.run_id,
            scenario = self.scenario.name(),
            model = self.llm.model_id(),
        );
        let result = self.run_inner(conversation).instrument(span).await;
        if let Ok(outcome) = &result {
            self.sink.finished(outcome);
        }
        result
    }

    /// Alternate user turns and runs until the stop condition fires or input ends
    pub async fn run_session(
        &mut self,
        conversation: Conversation,
    ) -> Result<SessionOutcome, LoopError> {
        let mut conversation = conversation;
        let mut turns = 0;
        let mut last_reason = None;

        loop {
            let prompt = self.scenario.input_prompt(!conversation.has_user_message());
            let Some(text) = self.read_input(prompt).await? else {
                tracing::info!(turns, "Input closed, ending session");
                break;
            };

            let message = Message::user(text);
            conversation.push(message.clone())?;
            self.sink.message(&message);

            let outcome = self.run(conversation).await?;
            turns += 1;
            let stopped = outcome.stopped_by_condition();
            conversation = outcome.conversation;
            last_reason = Some(outcome.reason);
            if stopped {
                break;
            }
        }

        Ok(SessionOutcome {
            conversation,
            turns,
            last_reason,
        })
    }

    async fn run_inner(&mut self, conversation: Conversation) -> Result<RunOutcome, LoopError> {
        let mut conversation = conversation;
        let mut state = LoopState::default();

        tracing::info!(seed_messages = conversation.len(), "Starting run");

        let mut events = VecDeque::from([Event::Start {
            has_user_message: conversation.has_user_message(),
            pending_calls: conversation.pending_tool_calls(),
        }]);

        // Process events in a loop - effects may generate further events
        while let Some(event) = events.pop_front() {
            let result = transition(&state, &self.context, event)?;

            if result.new_state.name() != state.name() {
                tracing::debug!(
                    from = state.name(),
                    to = result.new_state.name(),
                    iterations = result.new_state.iterations(),
                    "State transition"
                );
            }
            state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect, &mut conversation).await? {
                    events.push_back(generated);
                }
            }
        }

        match state {
            LoopState::Terminated {
                reason: TerminationReason::Exhausted,
                iterations,
            } => {
                tracing::warn!(iterations, "Iteration guard tripped");
                Err(LoopError::LoopExhausted { iterations })
            }
            LoopState::Terminated { reason, iterations } => {
                tracing::info!(iterations, reason = ?reason, "Run finished");
                Ok(RunOutcome {
                    reason,
                    iterations,
                    conversation,
                })
            }
            awaiting @ LoopState::AwaitingModel { .. } => Err(LoopError::Stalled(awaiting.name())),
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(
        &mut self,
        effect: Effect,
        conversation: &mut Conversation,
    ) -> Result<Option<Event>, LoopError> {
        match effect {
            Effect::AppendMessage { message } => {
                tracing::debug!(
                    role = message.role(),
                    chars = message.content().len(),
                    "Appending message"
                );
                conversation.push(message.clone())?;
                self.sink.message(&message);
                Ok(None)
            }

            Effect::RequestInput => {
                let prompt = self.scenario.input_prompt(!conversation.has_user_message());
                let event = match self.read_input(prompt).await? {
                    Some(text) => Event::UserInput { text },
                    None => {
                        tracing::debug!("No input available");
                        Event::InputUnavailable
                    }
                };
                Ok(Some(event))
            }

            Effect::RequestModel => {
                let request = self.build_request(conversation).await;
                let timeout = self.options.llm_timeout;

                tracing::info!(messages = request.messages.len(), "Making LLM request");

                // Race LLM request against cancellation
                let response = tokio::select! {
                    biased;

                    () = self.cancel.cancelled() => {
                        tracing::info!("LLM request cancelled");
                        return Err(LoopError::Cancelled);
                    }

                    result = tokio::time::timeout(timeout, self.llm.complete(&request)) => {
                        match result {
                            Ok(Ok(response)) => response,
                            Ok(Err(e)) => {
                                tracing::error!(
                                    error = %e,
                                    transient = e.kind.is_transient(),
                                    "Model gateway failed"
                                );
                                return Err(LoopError::GatewayUnavailable(e));
                            }
                            Err(_) => {
                                return Err(LoopError::GatewayUnavailable(LlmError::network(
                                    format!("Model request timed out after {}ms", timeout.as_millis()),
                                )));
                            }
                        }
                    }
                };

                if response.has_tool_use() {
                    tracing::info!(
                        tools = ?response.tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                        "Model requested tools"
                    );
                }

                Ok(Some(Event::ModelResponded {
                    message: response.into_message(),
                }))
            }

            Effect::ExecuteTools { calls } => {
                let results = if self.options.parallel_tools {
                    join_all(calls.iter().map(|call| self.execute_tool(call))).await
                } else {
                    let mut results = Vec::with_capacity(calls.len());
                    for call in &calls {
                        results.push(self.execute_tool(call).await);
                    }
                    results
                };
                Ok(Some(Event::ToolsCompleted { results }))
            }
        }
    }

    /// Wait for the next user line, giving up when the run is cancelled
    async fn read_input(&mut self, prompt: &str) -> Result<Option<String>, LoopError> {
        tokio::select! {
            biased;

            () = self.cancel.cancelled() => {
                tracing::info!("Input cancelled");
                Err(LoopError::Cancelled)
            }

            text = self.input.next_input(prompt) => Ok(text),
        }
    }

    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        tracing::info!(tool = %call.name, id = %call.id, "Executing tool");
        let ctx = ToolContext::new(Arc::clone(&self.session));

        match self.tools.execute(call, ctx).await {
            Ok(output) => ToolResult::success(&call.id, output),
            Err(e) => {
                tracing::warn!(tool = %call.name, id = %call.id, error = %e, "Tool failed");
                ToolResult::error(&call.id, &e)
            }
        }
    }

    async fn build_request(&self, conversation: &Conversation) -> LlmRequest {
        let document = self.session.document().await;
        LlmRequest {
            system: Some(build_system_prompt(self.scenario, &document)),
            messages: conversation.messages().to_vec(),
            tools: self.tools.definitions(),
            max_tokens: self.options.max_tokens,
        }
    }
}
