//! System prompt construction
//!
//! The calculator prompt is fixed. The drafter prompt embeds the current
//! document, so it is rebuilt before every model request.

use crate::scenario::Scenario;
use std::fmt::Write;

const CALCULATOR_PROMPT: &str =
    "You are a helpful assistant. Please answer my query to the best of your ability.";

const DRAFTER_PROMPT: &str = r"You are Drafter, a helpful writing assistant. You are going to help the user update and modify documents.

- If the user wants to update or modify content, use the 'update' tool with the complete updated content.
- If the user wants to save and finish, you need to use the 'save' tool.
- Make sure to always show the current document state after modifications.";

/// Build the system directive for one model request
pub fn build_system_prompt(scenario: Scenario, document: &str) -> String {
    match scenario {
        Scenario::Calculator => CALCULATOR_PROMPT.to_string(),
        Scenario::Drafter => {
            let mut prompt = String::from(DRAFTER_PROMPT);
            prompt.push_str("\n\nThe current document content is:");
            if document.is_empty() {
                prompt.push_str(" (empty)");
            } else {
                let _ = write!(prompt, "\n{document}");
            }
            prompt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculator_prompt_ignores_document() {
        assert_eq!(
            build_system_prompt(Scenario::Calculator, "anything"),
            CALCULATOR_PROMPT
        );
    }

    #[test]
    fn test_drafter_prompt_embeds_document() {
        let prompt = build_system_prompt(Scenario::Drafter, "Hello world");
        assert!(prompt.starts_with("You are Drafter"));
        assert!(prompt.ends_with("The current document content is:\nHello world"));
    }

    #[test]
    fn test_drafter_prompt_marks_empty_document() {
        let prompt = build_system_prompt(Scenario::Drafter, "");
        assert!(prompt.ends_with("(empty)"));
    }
}
