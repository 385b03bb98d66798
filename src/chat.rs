//! Conversational turn orchestration: condense, retrieve, stream, finalize

use futures_util::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, QueryCondenser};
use crate::providers::{EmbeddingProvider, FragmentStream, GenerationModel, VectorIndex};
use crate::retrieval::{LinkMap, Retriever, SourceAggregator, SourceRef};
use crate::session::Session;
use crate::types::{Message, Role};

/// Drives one conversation against the indexed corpus.
///
/// Owns the session for the process lifetime; turns are serialized — a
/// new question is rejected while a previous answer is still streaming.
pub struct ChatPipeline {
    condenser: QueryCondenser,
    retriever: Retriever,
    model: Arc<dyn GenerationModel>,
    links: LinkMap,
    session: Arc<Mutex<Session>>,
    config: ChatConfig,
    turn_in_flight: Arc<AtomicBool>,
}

impl ChatPipeline {
    /// Create a new chat pipeline from injected providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn GenerationModel>,
        index: Arc<dyn VectorIndex>,
        links: LinkMap,
        config: ChatConfig,
    ) -> Self {
        Self {
            condenser: QueryCondenser::new(Arc::clone(&model), config.llm.params.clone()),
            retriever: Retriever::new(embedder, index),
            model,
            links,
            session: Arc::new(Mutex::new(Session::new())),
            config,
            turn_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Snapshot of the conversational transcript, in insertion order
    pub fn transcript(&self) -> Vec<Message> {
        self.session.lock().messages().to_vec()
    }

    /// Append the synthetic greeting pair if it has not been shown yet
    pub fn greet(&self) -> bool {
        self.session.lock().greet()
    }

    /// Ask a question and stream the answer.
    ///
    /// Retrieval completes before generation starts; the user message is
    /// appended before generation begins so a failed or cancelled turn
    /// never loses it. The returned stream must be drained to finalize
    /// the session entry with citations; dropping it early cancels the
    /// turn, leaving the entry as accumulated-so-far with no citations.
    pub async fn ask(&self, question: &str) -> Result<AnswerStream> {
        if self.turn_in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::SessionState(
                "a turn is already in flight; drain or drop it first".to_string(),
            ));
        }
        let guard = TurnGuard {
            flag: Arc::clone(&self.turn_in_flight),
        };

        tracing::info!("Turn: \"{}\"", question);

        let phrase = self.condenser.condense(question).await?;
        let retrieved = self
            .retriever
            .retrieve(&phrase, self.config.retrieval.top_k)
            .await?;
        let grounding = SourceAggregator::aggregate(&retrieved, &self.links);

        tracing::debug!(
            "Grounding assembled from {} chunks across {} sources",
            retrieved.len(),
            grounding.sources.len()
        );

        let prompt = {
            let mut session = self.session.lock();
            session.greet();
            let history = session.messages().to_vec();
            session.append(Role::User, question);
            session.append(Role::Assistant, "");
            PromptBuilder::build_chat_prompt(&history, question, &grounding.context)
        };

        let fragments = self
            .model
            .stream(&prompt, &self.config.llm.params)
            .await?;

        Ok(AnswerStream {
            fragments,
            session: Arc::clone(&self.session),
            accumulated: String::new(),
            citation_fragment: grounding.citation_fragment,
            sources: grounding.sources,
            state: TurnState::Streaming,
            _guard: guard,
        })
    }
}

/// Clears the turn-in-flight flag when the turn ends, however it ends
struct TurnGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Streaming,
    Finalized,
    Failed,
}

/// Streamed answer for one turn.
///
/// Yields fragments in emission order, writing each through to the
/// session entry. Exhausting the stream finalizes the entry exactly once
/// with the accumulated text plus the citation fragment. Dropping the
/// stream early cancels the turn without finalizing.
pub struct AnswerStream {
    fragments: FragmentStream,
    session: Arc<Mutex<Session>>,
    accumulated: String,
    citation_fragment: String,
    sources: Vec<SourceRef>,
    state: TurnState,
    _guard: TurnGuard,
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("accumulated", &self.accumulated)
            .field("citation_fragment", &self.citation_fragment)
            .field("sources", &self.sources)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AnswerStream {
    /// Next fragment, or `None` once the stream is exhausted.
    ///
    /// A mid-stream provider error is yielded once as `Err`; text already
    /// delivered stays in the session entry, which is never finalized.
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        if self.state != TurnState::Streaming {
            return None;
        }

        match self.fragments.next().await {
            Some(Ok(fragment)) => {
                self.accumulated.push_str(&fragment);
                if let Err(e) = self.session.lock().extend_last(&fragment) {
                    tracing::error!("Streaming write-through failed: {}", e);
                }
                Some(Ok(fragment))
            }
            Some(Err(e)) => {
                self.state = TurnState::Failed;
                tracing::warn!("Generation failed mid-stream: {}", e);
                Some(Err(e))
            }
            None => {
                self.finalize();
                None
            }
        }
    }

    /// Drain the remaining fragments and return the finalized answer,
    /// citation fragment included.
    pub async fn drain(mut self) -> Result<String> {
        while let Some(fragment) = self.next_fragment().await {
            fragment?;
        }
        Ok(self.final_text())
    }

    /// Text accumulated so far, without the citation fragment
    pub fn answer(&self) -> &str {
        &self.accumulated
    }

    /// Rendered citation fragment for this turn
    pub fn citation_fragment(&self) -> &str {
        &self.citation_fragment
    }

    /// Ranked sources backing this turn
    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    /// Whether the stream was drained and the session entry finalized
    pub fn is_finalized(&self) -> bool {
        self.state == TurnState::Finalized
    }

    fn final_text(&self) -> String {
        if self.citation_fragment.is_empty() {
            self.accumulated.clone()
        } else {
            format!("{}\n\n{}", self.accumulated, self.citation_fragment)
        }
    }

    fn finalize(&mut self) {
        let final_text = self.final_text();
        match self.session.lock().finalize_last(final_text) {
            Ok(()) => self.state = TurnState::Finalized,
            Err(e) => {
                // Unreachable while the turn guard is held
                self.state = TurnState::Failed;
                tracing::error!("Finalize failed: {}", e);
            }
        }
    }
}
