//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use super::RunOutcome;
use crate::conversation::{Message, ToolCall};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ToolDefinition};
use crate::tools::{ToolContext, ToolError, ToolOutput, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for making LLM requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete an LLM request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Executor for tools
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Resolve and run one requested call
    async fn execute(&self, call: &ToolCall, ctx: ToolContext) -> Result<ToolOutput, ToolError>;

    /// Get tool definitions for LLM
    fn definitions(&self) -> Vec<ToolDefinition>;
}

/// Source of user messages, consulted when the conversation has none
#[async_trait]
pub trait InputSource: Send {
    /// Next user message, or `None` when no more input is available
    async fn next_input(&mut self, prompt: &str) -> Option<String>;
}

/// Receives every message appended during a run
pub trait OutputSink: Send + Sync {
    fn message(&self, message: &Message);

    fn finished(&self, _outcome: &RunOutcome) {}
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(&self, call: &ToolCall, ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        (**self).execute(call, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        (**self).definitions()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn message(&self, message: &Message) {
        (**self).message(message);
    }

    fn finished(&self, outcome: &RunOutcome) {
        (**self).finished(outcome);
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use an `LlmService` as `LlmClient`
pub struct GatewayClient {
    service: Arc<dyn LlmService>,
}

impl GatewayClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LlmClient for GatewayClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.service.complete(request).await
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, call: &ToolCall, ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        self.invoke(call, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        ToolRegistry::definitions(self)
    }
}

/// Input source that never has anything to say
pub struct NoInput;

#[async_trait]
impl InputSource for NoInput {
    async fn next_input(&mut self, _prompt: &str) -> Option<String> {
        None
    }
}

/// Sink that discards everything
pub struct NullSink;

impl OutputSink for NullSink {
    fn message(&self, _message: &Message) {}
}
