//! Terminal front end: stdin input and printed transcript

use crate::conversation::Message;
use crate::runtime::{InputSource, OutputSink};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Reads one line per turn from standard input
///
/// End of input or an empty line means the user has nothing more to say.
pub struct StdinInput {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn next_input(&mut self, prompt: &str) -> Option<String> {
        println!("\n{prompt}");
        match self.lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => Some(line.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read from stdin");
                None
            }
        }
    }
}

/// Prints every appended message to standard output
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn message(&self, message: &Message) {
        println!("{}", render(message));
    }
}

fn render(message: &Message) -> String {
    match message {
        Message::System { content } => format!("\nSYSTEM: {content}"),
        Message::User { content } => format!("\nUSER: {content}"),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut out = format!("\nAI: {content}");
            if !tool_calls.is_empty() {
                let names: Vec<&str> = tool_calls.iter().map(|c| c.name.as_str()).collect();
                out.push_str(&format!("\nUSING TOOLS: {names:?}"));
            }
            out
        }
        Message::ToolResult { content, .. } => format!("\nTOOL RESULT: {content}"),
    }
}
