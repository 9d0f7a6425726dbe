//! Document drafting tools
//!
//! `update` replaces the session's document buffer, `save` writes it to a
//! `.txt` file inside the session working directory.

use super::{parse_input, Tool, ToolContext, ToolError, ToolOutput, ToolSignal};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

const EXTENSION: &str = "txt";

/// Replace the document content
pub struct UpdateTool;

#[derive(Debug, Deserialize)]
struct UpdateInput {
    content: String,
}

#[async_trait]
impl Tool for UpdateTool {
    fn name(&self) -> &'static str {
        "update"
    }

    fn description(&self) -> String {
        "Updates the content with the provided content. Pass the complete updated document, not a diff.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["content"],
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The complete new document content"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        let UpdateInput { content } = parse_input(self.name(), input)?;
        ctx.session.set_document(content.clone()).await;
        Ok(ToolOutput::success(format!(
            "Document updated successfully\nCurrent content: {content}"
        )))
    }
}

/// Write the document to `<filename>.txt`
pub struct SaveTool;

#[derive(Debug, Deserialize)]
struct SaveInput {
    filename: String,
}

/// Append the `.txt` extension unless the name already carries it
pub fn normalize_filename(filename: &str) -> String {
    let has_extension = Path::new(filename)
        .extension()
        .is_some_and(|ext| ext == EXTENSION);
    if has_extension {
        filename.to_string()
    } else {
        format!("{filename}.{EXTENSION}")
    }
}

#[async_trait]
impl Tool for SaveTool {
    fn name(&self) -> &'static str {
        "save"
    }

    fn description(&self) -> String {
        "Save the current content to a text file and finish. Args: filename for the txt file."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["filename"],
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the text file; .txt is appended if missing"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> Result<ToolOutput, ToolError> {
        let SaveInput { filename } = parse_input(self.name(), input)?;
        if filename.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: "filename must not be empty".to_string(),
            });
        }

        let filename = normalize_filename(&filename);
        let path = ctx.session.working_dir().join(&filename);
        let content = ctx.session.document().await;

        tokio::fs::write(&path, content.as_bytes())
            .await
            .map_err(|e| ToolError::execution(self.name(), format!("Process failed. Error {e}")))?;

        tracing::info!(path = %path.display(), bytes = content.len(), "Document saved");
        Ok(ToolOutput::success(format!(
            "Operation successful. Document has been saved to {filename}"
        ))
        .with_signal(ToolSignal::DocumentSaved { path }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Session, SignalKind};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> ToolContext {
        ToolContext::new(Arc::new(Session::new(dir.path())))
    }

    #[test]
    fn test_normalize_filename() {
        assert_eq!(normalize_filename("notes"), "notes.txt");
        assert_eq!(normalize_filename("notes.txt"), "notes.txt");
        assert_eq!(normalize_filename("notes.md"), "notes.md.txt");
        assert_eq!(normalize_filename("notestxt"), "notestxt.txt");
        assert_eq!(normalize_filename("archive.v2"), "archive.v2.txt");
    }

    #[tokio::test]
    async fn test_update_then_save_writes_exact_content() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let out = UpdateTool
            .run(json!({"content": "Hello world"}), ctx.clone())
            .await
            .unwrap();
        assert_eq!(out.output, "Document updated successfully\nCurrent content: Hello world");
        assert!(out.signal.is_none());

        let out = SaveTool
            .run(json!({"filename": "notes"}), ctx.clone())
            .await
            .unwrap();
        assert_eq!(out.output, "Operation successful. Document has been saved to notes.txt");
        let signal = out.signal.unwrap();
        assert_eq!(signal.kind(), SignalKind::DocumentSaved);

        let saved = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(saved, "Hello world");
    }

    #[tokio::test]
    async fn test_save_with_extension_does_not_double_it() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        ctx.session.set_document("abc").await;

        SaveTool
            .run(json!({"filename": "notes.txt"}), ctx)
            .await
            .unwrap();

        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("notes.txt.txt").exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "old content that is longer").unwrap();
        let ctx = context(&dir);
        ctx.session.set_document("new").await;

        SaveTool.run(json!({"filename": "notes"}), ctx).await.unwrap();

        let saved = std::fs::read_to_string(dir.path().join("notes.txt")).unwrap();
        assert_eq!(saved, "new");
    }

    #[tokio::test]
    async fn test_save_failure_is_execution_error() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let err = SaveTool
            .run(json!({"filename": "missing/dir/notes"}), ctx)
            .await
            .unwrap_err();
        match err {
            ToolError::Execution { tool, message } => {
                assert_eq!(tool, "save");
                assert!(message.starts_with("Process failed."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_rejects_blank_filename() {
        let dir = TempDir::new().unwrap();
        let err = SaveTool
            .run(json!({"filename": "  "}), context(&dir))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
