//! Integer arithmetic tools for the calculator scenario

use super::{parse_input, Tool, ToolContext, ToolError, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Operation performed by an `ArithmeticTool`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
}

impl ArithmeticOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
        }
    }

    fn description(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "This is an addition function that adds 2 numbers together",
            ArithmeticOp::Subtract => {
                "This is a subtraction function that subtracts the second number (b) from the first (a)"
            }
            ArithmeticOp::Multiply => {
                "This is a multiplication function that multiplies 2 numbers"
            }
        }
    }

    /// Checked evaluation; `None` on overflow
    pub fn apply(self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithmeticOp::Add => a.checked_add(b),
            ArithmeticOp::Subtract => a.checked_sub(b),
            ArithmeticOp::Multiply => a.checked_mul(b),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BinaryInput {
    a: i64,
    b: i64,
}

/// Binary integer operation exposed as a tool
pub struct ArithmeticTool {
    op: ArithmeticOp,
}

impl ArithmeticTool {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Tool for ArithmeticTool {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> String {
        self.op.description().to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["a", "b"],
            "properties": {
                "a": { "type": "integer" },
                "b": { "type": "integer" }
            }
        })
    }

    async fn run(&self, input: Value, _ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        let BinaryInput { a, b } = parse_input(self.name(), input)?;
        let result = self
            .op
            .apply(a, b)
            .ok_or_else(|| {
                ToolError::execution(
                    self.name(),
                    format!("Integer overflow in {}({a}, {b})", self.name()),
                )
            })?;
        tracing::debug!(op = self.name(), a, b, result, "Arithmetic tool evaluated");
        Ok(ToolOutput::success(result.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Session;
    use std::sync::Arc;

    fn test_context() -> ToolContext {
        ToolContext::new(Arc::new(Session::new("/tmp")))
    }

    async fn run(op: ArithmeticOp, input: Value) -> Result<ToolOutput, ToolError> {
        ArithmeticTool::new(op).run(input, test_context()).await
    }

    #[tokio::test]
    async fn test_add() {
        let out = run(ArithmeticOp::Add, json!({"a": 40, "b": 12})).await.unwrap();
        assert_eq!(out.output, "52");
    }

    #[tokio::test]
    async fn test_subtract_is_first_minus_second() {
        let out = run(ArithmeticOp::Subtract, json!({"a": 52, "b": 5})).await.unwrap();
        assert_eq!(out.output, "47");
        let out = run(ArithmeticOp::Subtract, json!({"a": 5, "b": 52})).await.unwrap();
        assert_eq!(out.output, "-47");
    }

    #[tokio::test]
    async fn test_multiply() {
        let out = run(ArithmeticOp::Multiply, json!({"a": -3, "b": 7})).await.unwrap();
        assert_eq!(out.output, "-21");
    }

    #[tokio::test]
    async fn test_overflow_is_execution_error() {
        let err = run(ArithmeticOp::Multiply, json!({"a": i64::MAX, "b": 2}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
        assert_eq!(err.model_text(), format!("Integer overflow in multiply({}, 2)", i64::MAX));
    }

    #[tokio::test]
    async fn test_missing_and_fractional_arguments() {
        let err = run(ArithmeticOp::Add, json!({"a": 1})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        let err = run(ArithmeticOp::Add, json!({"a": 1.5, "b": 2})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
