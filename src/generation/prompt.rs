//! Prompt templates for conversational RAG generation

use crate::types::Message;

/// Fixed system instruction for answer generation
const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that answers questions about a \
private document collection. Ground every answer in the provided context. If the context does \
not contain the answer, say so instead of guessing.";

/// Prompt builder for chat and condensation calls
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the full chat prompt: system instruction, prior history
    /// transcript, and the current question augmented with grounding
    /// context.
    pub fn build_chat_prompt(history: &[Message], question: &str, context: &str) -> String {
        let mut prompt = String::with_capacity(
            SYSTEM_INSTRUCTION.len() + context.len() + question.len() + 256,
        );

        prompt.push_str(SYSTEM_INSTRUCTION);
        prompt.push_str("\n\n");

        for message in history {
            prompt.push_str(&format!("{}: {}\n\n", message.role, message.content));
        }

        prompt.push_str(&format!(
            "Context from the document collection:\n{}\n\nUser: {}\n\nAssistant:",
            context, question
        ));

        prompt
    }

    /// Build the fixed condensation instruction asking for a short
    /// retrieval phrase.
    pub fn build_condense_prompt(question: &str) -> String {
        format!(
            "Summarize the following question into a 3-5 word phrase optimized for document \
search. Reply with the phrase only.\n\nQuestion: {}\n\nPhrase:",
            question
        )
    }
}
