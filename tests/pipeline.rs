//! End-to-end pipeline tests with in-process providers

use async_trait::async_trait;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use doc_chat::chat::ChatPipeline;
use doc_chat::config::{ChatConfig, GenerationParams};
use doc_chat::error::{Error, Result};
use doc_chat::generation::QueryCondenser;
use doc_chat::ingestion::{IngestionPipeline, TextChunker};
use doc_chat::providers::{
    EmbeddingProvider, FragmentStream, GenerationModel, InMemoryIndex, VectorIndex,
};
use doc_chat::retrieval::{LinkMap, Retriever};
use doc_chat::types::{IndexRecord, Role};
use uuid::Uuid;

/// Deterministic embedder folding bytes into a fixed-dimension vector
struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % 8] += f32::from(byte) / 255.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        8
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash-embedder"
    }
}

/// Embedder that always fails, for batch-failure tests
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::retrieval("embedding service unavailable"))
    }

    fn dimensions(&self) -> usize {
        8
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing-embedder"
    }
}

/// Generation model that replays a scripted phrase and fragment sequence
struct ScriptedModel {
    phrase: String,
    fragments: Vec<String>,
    fail_after: Option<usize>,
}

impl ScriptedModel {
    fn new(phrase: &str, fragments: &[&str]) -> Self {
        Self {
            phrase: phrase.to_string(),
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            fail_after: None,
        }
    }

    fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl GenerationModel for ScriptedModel {
    async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        Ok(self.phrase.clone())
    }

    async fn stream(&self, _prompt: &str, _params: &GenerationParams) -> Result<FragmentStream> {
        let mut items: Vec<Result<String>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(Error::generation("scripted mid-stream failure")));
        }
        Ok(Box::pin(tokio_stream::iter(items)))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

async fn record_for(text: &str, source_id: &str) -> IndexRecord {
    IndexRecord {
        id: Uuid::new_v4(),
        vector: HashEmbedder.embed(text).await.unwrap(),
        text: text.to_string(),
        source_id: source_id.to_string(),
    }
}

fn pipeline_with(
    model: ScriptedModel,
    index: Arc<dyn VectorIndex>,
    links: LinkMap,
) -> ChatPipeline {
    ChatPipeline::new(
        Arc::new(HashEmbedder),
        Arc::new(model),
        index,
        links,
        ChatConfig::default(),
    )
}

#[tokio::test]
async fn ingestion_indexes_every_chunk() {
    let dir = TempDir::new().unwrap();
    let content: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    fs::write(dir.path().join("handbook.md"), &content).unwrap();

    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new());
    let pipeline = IngestionPipeline::new(
        TextChunker::new(1000, 20).unwrap(),
        Arc::new(HashEmbedder),
        Arc::clone(&index),
        ChatConfig::default().ingestion,
    );

    let count = pipeline.ingest(dir.path()).await.unwrap();
    assert_eq!(count, 3);
    assert_eq!(index.len().await.unwrap(), 3);
}

#[tokio::test]
async fn reingestion_creates_duplicates() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "some short document").unwrap();

    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryIndex::new());
    let pipeline = IngestionPipeline::new(
        TextChunker::new(1000, 20).unwrap(),
        Arc::new(HashEmbedder),
        Arc::clone(&index),
        ChatConfig::default().ingestion,
    );

    pipeline.ingest(dir.path()).await.unwrap();
    pipeline.ingest(dir.path()).await.unwrap();
    assert_eq!(index.len().await.unwrap(), 2);
}

#[tokio::test]
async fn failed_batch_reports_its_offset() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.md"), "x".repeat(500)).unwrap();

    let pipeline = IngestionPipeline::new(
        TextChunker::new(100, 10).unwrap(),
        Arc::new(FailingEmbedder),
        Arc::new(InMemoryIndex::new()),
        ChatConfig::default().ingestion,
    );

    let err = pipeline.ingest(dir.path()).await.unwrap_err();
    match err {
        Error::Ingestion { offset, .. } => assert_eq!(offset, 0),
        other => panic!("expected ingestion error, got {:?}", other),
    }
}

#[tokio::test]
async fn retrieval_is_bounded_by_available_records() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![
            record_for("alpha text", "a.md").await,
            record_for("beta text", "b.md").await,
            record_for("gamma text", "c.md").await,
        ])
        .await
        .unwrap();

    let retriever = Retriever::new(Arc::new(HashEmbedder), index);
    let results = retriever.retrieve("alpha", 5).await.unwrap();
    assert!(results.len() <= 5);
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn retrieval_rejects_non_positive_k() {
    let retriever = Retriever::new(Arc::new(HashEmbedder), Arc::new(InMemoryIndex::new()));
    let err = retriever.retrieve("anything", 0).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn condenser_returns_trimmed_phrase() {
    let model: Arc<dyn GenerationModel> =
        Arc::new(ScriptedModel::new("  vector index basics \n", &[]));
    let condenser = QueryCondenser::new(model, GenerationParams::default());
    let phrase = condenser.condense("how does the vector index work?").await.unwrap();
    assert_eq!(phrase, "vector index basics");
}

#[tokio::test]
async fn full_turn_streams_and_finalizes_with_citations() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![
            record_for("chunking splits documents", "./data/guide.md").await,
            record_for("overlap preserves continuity", "./data/guide.md").await,
            record_for("embeddings are vectors", "./data/api.md").await,
        ])
        .await
        .unwrap();

    let model = ScriptedModel::new("chunking overlap", &["Chunking ", "splits ", "documents."]);
    let pipeline = pipeline_with(model, index, LinkMap::empty("./data/"));

    let stream = pipeline.ask("what is chunking?").await.unwrap();
    let answer = stream.drain().await.unwrap();

    assert!(answer.starts_with("Chunking splits documents."));
    assert!(answer.contains("Sources:"));
    assert!(answer.contains("guide.md"));

    let transcript = pipeline.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[0].role, Role::User);
    assert_eq!(transcript[0].content, "Hello");
    assert_eq!(transcript[1].role, Role::Assistant);
    assert_eq!(transcript[1].content, "How may I assist you today?");
    assert_eq!(transcript[2].content, "what is chunking?");
    assert_eq!(transcript[3].content, answer);
}

#[tokio::test]
async fn greeting_appears_once_across_turns() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![record_for("some text", "a.md").await])
        .await
        .unwrap();

    let model = ScriptedModel::new("phrase", &["answer"]);
    let pipeline = pipeline_with(model, index, LinkMap::empty("./data/"));

    pipeline.ask("first?").await.unwrap().drain().await.unwrap();
    pipeline.ask("second?").await.unwrap().drain().await.unwrap();

    let transcript = pipeline.transcript();
    let greetings = transcript
        .iter()
        .filter(|m| m.content == "Hello" || m.content == "How may I assist you today?")
        .count();
    assert_eq!(greetings, 2);
    assert_eq!(transcript[0].content, "Hello");
    assert_eq!(transcript[1].content, "How may I assist you today?");
    assert_eq!(transcript.len(), 6);
}

#[tokio::test]
async fn cancelled_turn_keeps_partial_text_without_citations() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![record_for("indexed text", "./data/guide.md").await])
        .await
        .unwrap();

    let fragments: Vec<String> = (0..10).map(|i| format!("frag{} ", i)).collect();
    let fragment_refs: Vec<&str> = fragments.iter().map(String::as_str).collect();
    let model = ScriptedModel::new("phrase", &fragment_refs);
    let pipeline = pipeline_with(model, index, LinkMap::empty("./data/"));

    let mut stream = pipeline.ask("question?").await.unwrap();
    let first = stream.next_fragment().await.unwrap().unwrap();
    let second = stream.next_fragment().await.unwrap().unwrap();
    assert!(!stream.is_finalized());
    drop(stream);

    let transcript = pipeline.transcript();
    let last = transcript.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, format!("{}{}", first, second));
    assert!(!last.content.contains("Sources:"));
}

#[tokio::test]
async fn midstream_failure_leaves_partial_text_unfinalized() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![record_for("indexed text", "./data/guide.md").await])
        .await
        .unwrap();

    let model = ScriptedModel::new("phrase", &["delivered "]).failing_after(1);
    let pipeline = pipeline_with(model, index, LinkMap::empty("./data/"));

    let mut stream = pipeline.ask("question?").await.unwrap();
    assert_eq!(stream.next_fragment().await.unwrap().unwrap(), "delivered ");

    let err = stream.next_fragment().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
    assert!(stream.next_fragment().await.is_none());
    assert!(!stream.is_finalized());
    drop(stream);

    let transcript = pipeline.transcript();
    let last = transcript.last().unwrap();
    assert_eq!(last.content, "delivered ");
    assert!(!last.content.contains("Sources:"));

    // The user's message survives the failed generation
    assert_eq!(transcript[transcript.len() - 2].role, Role::User);
    assert_eq!(transcript[transcript.len() - 2].content, "question?");
}

#[tokio::test]
async fn concurrent_turns_are_rejected() {
    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![record_for("indexed text", "a.md").await])
        .await
        .unwrap();

    let model = ScriptedModel::new("phrase", &["slow ", "answer"]);
    let pipeline = pipeline_with(model, index, LinkMap::empty("./data/"));

    let stream = pipeline.ask("first?").await.unwrap();
    let err = pipeline.ask("second?").await.unwrap_err();
    assert!(matches!(err, Error::SessionState(_)));

    drop(stream);
    assert!(pipeline.ask("third?").await.is_ok());
}

#[tokio::test]
async fn citations_resolve_through_the_link_map() {
    let dir = TempDir::new().unwrap();
    let links_path = dir.path().join("links.csv");
    fs::write(&links_path, "guide.md,https://docs.example.com/guide\n").unwrap();
    let links = LinkMap::load(&links_path, "./data/").unwrap();

    let index = Arc::new(InMemoryIndex::new());
    index
        .upsert(vec![
            record_for("mapped chunk", "./data/guide.md").await,
            record_for("unmapped chunk", "./data/other.md").await,
        ])
        .await
        .unwrap();

    let model = ScriptedModel::new("phrase", &["answer"]);
    let pipeline = pipeline_with(model, index, links);

    let answer = pipeline.ask("question?").await.unwrap().drain().await.unwrap();
    assert!(answer.contains("[guide.md](https://docs.example.com/guide)"));
    assert!(answer.contains("other.md"));
    assert!(!answer.contains("[other.md]("));
}
