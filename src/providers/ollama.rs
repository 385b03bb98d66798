//! Ollama HTTP client implementing embeddings and generation with retry

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{EmbeddingConfig, GenerationParams, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{FragmentStream, GenerationModel};

/// Ollama API client shared by the embedding and generation providers
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embed_model: String,
    generate_model: String,
    dimensions: usize,
    max_retries: u32,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

impl GenerateOptions {
    fn from_params(params: &GenerationParams) -> Self {
        Self {
            num_predict: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            stop: params.stop.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

impl OllamaClient {
    /// Create a new client bounded by the configured timeout
    pub fn new(llm: &LlmConfig, embeddings: &EmbeddingConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: llm.base_url.clone(),
            embed_model: embeddings.model.clone(),
            generate_model: llm.generate_model.clone(),
            dimensions: embeddings.dimensions,
            max_retries: llm.max_retries,
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Ollama request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::generation("unknown error")))
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: self.embed_model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::retrieval(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::retrieval(format!(
                "embedding failed: HTTP {}",
                response.status()
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::retrieval(format!("malformed embedding response: {}", e)))?;

        Ok(embed_response.embedding)
    }

    async fn generate_once(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: self.generate_model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions::from_params(params),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!(
                "generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("malformed generation response: {}", e)))?;

        Ok(generate_response.response)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.retry_request(|| self.embed_once(text)).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl GenerationModel for OllamaClient {
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.retry_request(|| self.generate_once(prompt, params)).await
    }

    /// Open a streaming generation call. Fragments are parsed from the
    /// NDJSON response body, buffering partial lines across network reads.
    async fn stream(&self, prompt: &str, params: &GenerationParams) -> Result<FragmentStream> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: self.generate_model.clone(),
            prompt: prompt.to_string(),
            stream: true,
            options: GenerateOptions::from_params(params),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::generation(format!("stream request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::generation(format!(
                "stream failed: HTTP {}",
                response.status()
            )));
        }

        struct StreamState {
            bytes: Pin<Box<dyn futures_util::Stream<Item = reqwest::Result<bytes::Bytes>> + Send>>,
            buffer: String,
            done: bool,
        }

        let state = StreamState {
            bytes: Box::pin(response.bytes_stream()),
            buffer: String::new(),
            done: false,
        };

        let fragments = stream::unfold(state, |mut st| async move {
            loop {
                if st.done {
                    return None;
                }

                if let Some(pos) = st.buffer.find('\n') {
                    let line: String = st.buffer.drain(..=pos).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<StreamChunk>(line) {
                        Ok(chunk) => {
                            if chunk.done {
                                st.done = true;
                            }
                            if !chunk.response.is_empty() {
                                return Some((Ok(chunk.response), st));
                            }
                            if st.done {
                                return None;
                            }
                        }
                        Err(e) => {
                            st.done = true;
                            return Some((
                                Err(Error::generation(format!("malformed stream line: {}", e))),
                                st,
                            ));
                        }
                    }
                    continue;
                }

                match st.bytes.next().await {
                    Some(Ok(bytes)) => {
                        st.buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        st.done = true;
                        return Some((
                            Err(Error::generation(format!("stream error: {}", e))),
                            st,
                        ));
                    }
                    None => {
                        let line = st.buffer.trim().to_string();
                        st.buffer.clear();
                        st.done = true;
                        if line.is_empty() {
                            return None;
                        }
                        match serde_json::from_str::<StreamChunk>(&line) {
                            Ok(chunk) if !chunk.response.is_empty() => {
                                return Some((Ok(chunk.response), st));
                            }
                            _ => return None,
                        }
                    }
                }
            }
        });

        Ok(Box::pin(fragments))
    }

    async fn health_check(&self) -> Result<bool> {
        EmbeddingProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}
