//! Mock implementations for testing
//!
//! These mocks enable loop testing without a network or a terminal.

use super::traits::*;
use super::RunOutcome;
use crate::conversation::{Message, ToolCall};
use crate::llm::{LlmError, LlmRequest, LlmResponse, ToolDefinition};
use crate::tools::{ToolContext, ToolError, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<LlmResponse, LlmError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock LLM client that sleeps before answering (for timeout and cancellation testing)
pub struct DelayedMockLlmClient {
    inner: MockLlmClient,
    delay: Duration,
}

impl DelayedMockLlmClient {
    pub fn new(model_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: MockLlmClient::new(model_id),
            delay,
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.inner.queue_response(response);
    }
}

#[async_trait]
impl LlmClient for DelayedMockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.inner.next_response()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

// ============================================================================
// Mock Tool Executor
// ============================================================================

/// Mock tool executor with predefined outcomes
pub struct MockToolExecutor {
    outcomes: HashMap<String, Result<ToolOutput, ToolError>>,
    definitions: Vec<ToolDefinition>,
    /// Record of tool executions
    pub executions: Mutex<Vec<(String, Value)>>,
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            definitions: Vec::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Add a tool with a predefined output
    pub fn with_tool(self, name: impl Into<String>, output: ToolOutput) -> Self {
        self.with_outcome(name.into(), Ok(output))
    }

    /// Add a tool that always fails
    pub fn with_failing_tool(self, name: impl Into<String>, error: ToolError) -> Self {
        self.with_outcome(name.into(), Err(error))
    }

    fn with_outcome(mut self, name: String, outcome: Result<ToolOutput, ToolError>) -> Self {
        self.definitions.push(ToolDefinition {
            name: name.clone(),
            description: format!("Mock {name}"),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        });
        self.outcomes.insert(name, outcome);
        self
    }

    /// Get recorded executions
    pub fn recorded_executions(&self) -> Vec<(String, Value)> {
        self.executions.lock().unwrap().clone()
    }
}

impl Default for MockToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    async fn execute(&self, call: &ToolCall, _ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        self.executions
            .lock()
            .unwrap()
            .push((call.name.clone(), call.arguments.clone()));
        self.outcomes
            .get(&call.name)
            .cloned()
            .unwrap_or_else(|| Err(ToolError::UnknownTool(call.name.clone())))
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }
}

// ============================================================================
// Scripted input and recording output
// ============================================================================

/// Input source that replays a fixed list of lines, then reports end of input
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts shown so far, shared so they stay readable after the source is moved
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_input(&mut self, prompt: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.lines.pop_front()
    }
}

/// Input that never produces a line, like a user who walked away from the prompt
pub struct PendingInput;

#[async_trait]
impl InputSource for PendingInput {
    async fn next_input(&mut self, _prompt: &str) -> Option<String> {
        futures::future::pending().await
    }
}

/// Sink that records everything it is shown
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<Message>>,
    finished: Mutex<usize>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn finished_count(&self) -> usize {
        *self.finished.lock().unwrap()
    }
}

impl OutputSink for RecordingSink {
    fn message(&self, message: &Message) {
        self.messages.lock().unwrap().push(message.clone());
    }

    fn finished(&self, _outcome: &RunOutcome) {
        *self.finished.lock().unwrap() += 1;
    }
}
