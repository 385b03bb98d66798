//! Conversation session: an ordered message log with a guarded finalize step

use crate::error::{Error, Result};
use crate::types::{Message, Role};

/// Synthetic greeting pair shown once per session
const GREETING_USER: &str = "Hello";
const GREETING_ASSISTANT: &str = "How may I assist you today?";

/// Ordered conversational message log.
///
/// Append-only, except that the most recently appended assistant message
/// may be extended while its answer streams and finalized exactly once
/// afterwards to attach the citation block.
#[derive(Debug, Default)]
pub struct Session {
    messages: Vec<Message>,
    greeted: bool,
    finalizable: bool,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the log
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the synthetic greeting pair. Runs at most once; subsequent
    /// calls are no-ops. Returns whether the greeting was appended.
    pub fn greet(&mut self) -> bool {
        if self.greeted {
            return false;
        }
        self.greeted = true;
        self.append(Role::User, GREETING_USER);
        self.append(Role::Assistant, GREETING_ASSISTANT);
        true
    }

    /// Append a message to the end of the log. Always legal.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
        self.finalizable = role == Role::Assistant;
    }

    /// Append a streamed fragment to the most recent message's content.
    ///
    /// Legal only while the last message is the un-finalized assistant
    /// entry of the current turn.
    pub fn extend_last(&mut self, fragment: &str) -> Result<()> {
        if !self.finalizable {
            return Err(Error::SessionState(
                "no assistant message is open for streaming".to_string(),
            ));
        }
        let last = self
            .messages
            .last_mut()
            .expect("finalizable implies a message exists");
        last.content.push_str(fragment);
        Ok(())
    }

    /// Replace the content of the most recently appended message.
    ///
    /// Legal exactly once per assistant turn, immediately after the
    /// assistant append (and its streaming extensions) and before any
    /// further append. A second call is a state machine violation.
    pub fn finalize_last(&mut self, content: impl Into<String>) -> Result<()> {
        if !self.finalizable {
            return Err(Error::SessionState(
                "finalize_last called with no open assistant message".to_string(),
            ));
        }
        let last = self
            .messages
            .last_mut()
            .expect("finalizable implies a message exists");
        last.content = content.into();
        self.finalizable = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_empty() {
        let session = Session::new();
        assert!(session.is_empty());
    }

    #[test]
    fn greeting_appears_once_at_the_front() {
        let mut session = Session::new();
        assert!(session.greet());
        assert!(!session.greet());

        session.append(Role::User, "what is chunking?");
        session.append(Role::Assistant, "splitting text into windows");
        assert!(!session.greet());

        assert_eq!(session.len(), 4);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].content, GREETING_USER);
        assert_eq!(session.messages()[1].role, Role::Assistant);
        assert_eq!(session.messages()[1].content, GREETING_ASSISTANT);
    }

    #[test]
    fn finalize_replaces_last_assistant_content() {
        let mut session = Session::new();
        session.append(Role::User, "question");
        session.append(Role::Assistant, "");
        session.extend_last("partial ").unwrap();
        session.extend_last("answer").unwrap();
        assert_eq!(session.messages()[1].content, "partial answer");

        session.finalize_last("partial answer\n\nSources:").unwrap();
        assert_eq!(session.messages()[1].content, "partial answer\n\nSources:");
    }

    #[test]
    fn second_finalize_is_rejected() {
        let mut session = Session::new();
        session.append(Role::User, "question");
        session.append(Role::Assistant, "answer");
        session.finalize_last("answer (cited)").unwrap();

        let err = session.finalize_last("overwrite").unwrap_err();
        assert!(matches!(err, Error::SessionState(_)));
        assert_eq!(session.messages()[1].content, "answer (cited)");
    }

    #[test]
    fn finalize_after_user_append_is_rejected() {
        let mut session = Session::new();
        session.append(Role::User, "question");
        assert!(session.finalize_last("answer").is_err());

        session.append(Role::Assistant, "answer");
        session.append(Role::User, "next question");
        assert!(session.finalize_last("too late").is_err());
    }

    #[test]
    fn extend_requires_an_open_assistant_message() {
        let mut session = Session::new();
        assert!(session.extend_last("x").is_err());
        session.append(Role::User, "question");
        assert!(session.extend_last("x").is_err());
        session.append(Role::Assistant, "");
        assert!(session.extend_last("x").is_ok());
        session.finalize_last("x").unwrap();
        assert!(session.extend_last("y").is_err());
    }
}
