//! doc-chat CLI
//!
//! `doc-chat ingest <dir>` indexes a corpus directory out-of-band;
//! `doc-chat chat` starts the interactive conversation loop.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use doc_chat::chat::ChatPipeline;
use doc_chat::config::ChatConfig;
use doc_chat::ingestion::{IngestionPipeline, TextChunker};
use doc_chat::providers::{
    EmbeddingProvider, GenerationModel, OllamaClient, OpenSearchIndex, VectorIndex,
};
use doc_chat::retrieval::LinkMap;
use doc_chat::types::Role;

#[derive(Parser)]
#[command(name = "doc-chat", about = "Documentation chat with source citations")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "doc-chat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a corpus directory into the vector index
    Ingest {
        /// Directory to scan for Markdown files
        dir: PathBuf,
    },
    /// Start the interactive chat loop
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_chat=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Configuration failures are fatal before any query is accepted
    let config = if cli.config.exists() {
        ChatConfig::load(&cli.config)?
    } else {
        tracing::warn!("No config file at {}, using defaults", cli.config.display());
        let config = ChatConfig::default();
        config.validate()?;
        config
    };

    let ollama = Arc::new(OllamaClient::new(&config.llm, &config.embeddings));
    let embedder: Arc<dyn EmbeddingProvider> = ollama.clone();
    let model: Arc<dyn GenerationModel> = ollama.clone();
    let index: Arc<dyn VectorIndex> = Arc::new(OpenSearchIndex::new(&config.index));

    if !embedder.health_check().await.unwrap_or(false) {
        tracing::warn!("Model endpoint not reachable at {}", config.llm.base_url);
    }
    if !index.health_check().await.unwrap_or(false) {
        tracing::warn!("Vector index not reachable at {}", config.index.base_url);
    }

    match cli.command {
        Command::Ingest { dir } => {
            let chunker = TextChunker::new(
                config.chunking.max_chunk_size,
                config.chunking.overlap_size,
            )?;
            let pipeline =
                IngestionPipeline::new(chunker, embedder, index, config.ingestion.clone());

            let count = pipeline
                .ingest(&dir)
                .await
                .with_context(|| format!("ingestion of {} failed", dir.display()))?;
            println!("Indexed {} chunks from {}", count, dir.display());
        }
        Command::Chat => {
            let links = match &config.links.path {
                Some(path) => LinkMap::load(path, config.links.strip_prefix.clone())?,
                None => LinkMap::empty(config.links.strip_prefix.clone()),
            };

            let example_questions = config.example_questions.clone();
            let pipeline = ChatPipeline::new(embedder, model, index, links, config);
            run_chat_loop(pipeline, &example_questions).await?;
        }
    }

    Ok(())
}

/// Interactive loop: read questions from stdin, stream answers to stdout
async fn run_chat_loop(
    pipeline: ChatPipeline,
    example_questions: &[String],
) -> anyhow::Result<()> {
    println!("Documentation Chat");
    if !example_questions.is_empty() {
        println!("\nExample questions:");
        for question in example_questions {
            println!("  - {}", question);
        }
    }
    println!();

    pipeline.greet();
    for message in pipeline.transcript() {
        print_turn(message.role, &message.content);
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "/quit" || question == "/exit" {
            break;
        }

        let mut stream = match pipeline.ask(question).await {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("\nTurn failed: {}\n", e);
                continue;
            }
        };

        let mut failed = false;
        while let Some(fragment) = stream.next_fragment().await {
            match fragment {
                Ok(text) => {
                    print!("{}", text);
                    stdout.flush()?;
                }
                Err(e) => {
                    eprintln!("\n\nAnswer interrupted: {}", e);
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            if !stream.citation_fragment().is_empty() {
                println!("\n\n{}", stream.citation_fragment());
            } else {
                println!();
            }
        }
        println!();
    }

    Ok(())
}

fn print_turn(role: Role, content: &str) {
    println!("{}: {}\n", role, content);
}
