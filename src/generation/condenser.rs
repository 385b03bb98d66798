//! Query condensation: compress a question into a short retrieval phrase

use std::sync::Arc;

use crate::config::GenerationParams;
use crate::error::Result;
use crate::providers::GenerationModel;

use super::prompt::PromptBuilder;

/// Condenses user questions into retrieval-oriented phrases using the
/// generation model. Model failures propagate unchanged; retry policy
/// lives in the model client, not here.
pub struct QueryCondenser {
    model: Arc<dyn GenerationModel>,
    params: GenerationParams,
}

impl QueryCondenser {
    /// Create a new condenser
    pub fn new(model: Arc<dyn GenerationModel>, params: GenerationParams) -> Self {
        Self { model, params }
    }

    /// Condense a question into a short phrase, trimmed
    pub async fn condense(&self, question: &str) -> Result<String> {
        let prompt = PromptBuilder::build_condense_prompt(question);
        let response = self.model.complete(&prompt, &self.params).await?;
        let phrase = response.trim().to_string();

        tracing::debug!("Condensed \"{}\" to \"{}\"", question, phrase);
        Ok(phrase)
    }
}
