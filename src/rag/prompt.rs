//! Prompt assembly.
//!
//! The user turn sent to the model is built in a fixed order: the context
//! block with every retrieved chunk (best match first), then the question
//! marker, then the whole conversation replayed verbatim.

use crate::vector_store::RetrievalResult;
use serde::{Deserialize, Serialize};

/// Opens the context block.
pub const CONTEXT_OPEN: &str = "<CONTEXT>\n";
/// Separates retrieved chunks inside the context block.
pub const CHUNK_DELIMITER: &str = "\n\n-------\n\n";
/// Closes the context block.
pub const CONTEXT_CLOSE: &str = "\n-------\n</CONTEXT>\n\n\n\n";
/// Introduces the conversation.
pub const QUESTION_MARKER: &str = "MY QUESTION:\n";
/// Separates conversation turns.
pub const TURN_DELIMITER: &str = "\n\n";

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// One turn of the caller's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The two messages sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentedPrompt {
    pub system: String,
    pub user: String,
}

/// Serialize the conversation as `"{role}: {content}"` turns, oldest first.
pub fn format_history(history: &[ConversationMessage]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join(TURN_DELIMITER)
}

/// Build the prompt for one request.
pub fn assemble(
    system_instruction: &str,
    retrieved: &[RetrievalResult],
    history: &[ConversationMessage],
) -> AugmentedPrompt {
    let context = retrieved
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CHUNK_DELIMITER);

    let mut user = String::with_capacity(context.len() + 64);
    user.push_str(CONTEXT_OPEN);
    user.push_str(&context);
    user.push_str(CONTEXT_CLOSE);
    user.push_str(QUESTION_MARKER);
    user.push_str(&format_history(history));

    AugmentedPrompt {
        system: system_instruction.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TranscriptChunk;

    fn result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            chunk: TranscriptChunk::new(text, "vid", "Title", 0),
            score,
        }
    }

    #[test]
    fn test_exact_layout() {
        let prompt = assemble(
            "Be helpful.",
            &[result("chunk one", 0.9), result("chunk two", 0.5)],
            &[ConversationMessage::user("What happened?")],
        );

        assert_eq!(prompt.system, "Be helpful.");
        assert_eq!(
            prompt.user,
            "<CONTEXT>\nchunk one\n\n-------\n\nchunk two\n-------\n</CONTEXT>\n\n\n\nMY QUESTION:\nuser: What happened?"
        );
    }

    #[test]
    fn test_every_chunk_once_in_order() {
        let retrieved = vec![result("alpha text", 0.9), result("beta text", 0.8), result("gamma text", 0.1)];
        let prompt = assemble("sys", &retrieved, &[ConversationMessage::user("q")]);

        for r in &retrieved {
            assert_eq!(prompt.user.matches(&r.chunk.text).count(), 1);
        }
        let a = prompt.user.find("alpha text").unwrap();
        let b = prompt.user.find("beta text").unwrap();
        let c = prompt.user.find("gamma text").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_history_in_original_order() {
        let history = vec![
            ConversationMessage::user("Who is speaking?"),
            ConversationMessage::assistant("A geologist."),
            ConversationMessage::user("What about?"),
        ];
        let prompt = assemble("sys", &[result("ctx", 1.0)], &history);

        let section = prompt.user.split(QUESTION_MARKER).nth(1).unwrap();
        assert_eq!(
            section,
            "user: Who is speaking?\n\nassistant: A geologist.\n\nuser: What about?"
        );
    }

    #[test]
    fn test_empty_context_keeps_history() {
        let prompt = assemble("sys", &[], &[ConversationMessage::user("Anything?")]);
        assert!(prompt.user.starts_with("<CONTEXT>\n\n-------\n</CONTEXT>"));
        assert!(prompt.user.ends_with("MY QUESTION:\nuser: Anything?"));
    }

    #[test]
    fn test_deterministic() {
        let retrieved = vec![result("x", 0.3)];
        let history = vec![ConversationMessage::user("y")];
        assert_eq!(assemble("s", &retrieved, &history), assemble("s", &retrieved, &history));
    }

    #[test]
    fn test_role_serde() {
        let msg: ConversationMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(serde_json::from_str::<ConversationMessage>(r#"{"role":"bot","content":"hi"}"#).is_err());
    }
}
