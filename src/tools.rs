//! Tool registry and the tools shipped with each scenario
//!
//! Tools are stateless singletons. Per-call state (the working directory and
//! the document being drafted) lives in the session handed over through
//! `ToolContext`.

mod arithmetic;
mod document;

pub use arithmetic::{ArithmeticOp, ArithmeticTool};
pub use document::{SaveTool, UpdateTool};

use crate::conversation::ToolCall;
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Structured side-channel outcome of a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSignal {
    /// The document buffer was written to disk
    DocumentSaved { path: PathBuf },
}

impl ToolSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            ToolSignal::DocumentSaved { .. } => SignalKind::DocumentSaved,
        }
    }
}

/// Signal discriminant, used to configure stop conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    DocumentSaved,
}

/// Result from a successful tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub output: String,
    pub signal: Option<ToolSignal>,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            signal: None,
        }
    }

    pub fn with_signal(mut self, signal: ToolSignal) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// Failures of a single tool invocation
///
/// None of these abort the loop; they are reported back to the model as
/// error-flagged tool results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("Tool {tool} failed: {message}")]
    Execution { tool: String, message: String },
}

impl ToolError {
    pub fn execution(tool: &str, message: impl Into<String>) -> Self {
        ToolError::Execution {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Text handed back to the model
    ///
    /// Execution failures are worded by the tool itself.
    pub fn model_text(&self) -> String {
        match self {
            ToolError::Execution { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Errors found while building a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
    #[error("invalid schema for tool {tool}: {reason}")]
    InvalidSchema { tool: String, reason: String },
}

/// Deserialize tool input into its typed form
pub fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Session-scoped state shared by the tools of one run
#[derive(Debug)]
pub struct Session {
    working_dir: PathBuf,
    document: RwLock<String>,
}

impl Session {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            document: RwLock::new(String::new()),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Current document content
    pub async fn document(&self) -> String {
        self.document.read().await.clone()
    }

    /// Replace the document content (last write wins)
    pub async fn set_document(&self, content: impl Into<String>) {
        *self.document.write().await = content.into();
    }
}

/// All context needed for a tool invocation
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub session: Arc<Session>,
}

impl ToolContext {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

/// Trait for tools that can be executed by the agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool with validated context
    async fn run(&self, input: Value, ctx: ToolContext) -> Result<ToolOutput, ToolError>;
}

/// Closed name -> tool table, validated at construction
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            validate_schema(tool.name(), &tool.input_schema())?;
            if index.insert(tool.name().to_string(), i).is_some() {
                return Err(RegistryError::DuplicateName(tool.name().to_string()));
            }
        }
        Ok(Self { tools, index })
    }

    /// `add`, `subtract` and `multiply`
    pub fn calculator() -> Result<Self, RegistryError> {
        Self::new(vec![
            Arc::new(ArithmeticTool::new(ArithmeticOp::Add)),
            Arc::new(ArithmeticTool::new(ArithmeticOp::Subtract)),
            Arc::new(ArithmeticTool::new(ArithmeticOp::Multiply)),
        ])
    }

    /// `update` and `save`
    pub fn drafter() -> Result<Self, RegistryError> {
        Self::new(vec![Arc::new(UpdateTool), Arc::new(SaveTool)])
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Resolve and run a requested call
    pub async fn invoke(&self, call: &ToolCall, ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        let tool = self.resolve(&call.name)?;
        tool.run(call.arguments.clone(), ctx).await
    }

    /// Get all tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

fn validate_schema(tool: &str, schema: &Value) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidSchema {
        tool: tool.to_string(),
        reason: reason.to_string(),
    };

    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(invalid("schema type must be \"object\""));
    }
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing \"properties\" object"))?;

    if let Some(required) = schema.get("required") {
        let required = required
            .as_array()
            .ok_or_else(|| invalid("\"required\" must be an array"))?;
        for name in required {
            let name = name
                .as_str()
                .ok_or_else(|| invalid("\"required\" entries must be strings"))?;
            if !properties.contains_key(name) {
                return Err(invalid(&format!("required parameter {name} is not declared")));
            }
        }
    }
    Ok(())
}
