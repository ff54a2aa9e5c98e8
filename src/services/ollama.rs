use crate::core::similarity::{SimilarityError, SimilarityMatrix, SimilarityProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

/// Similarity provider backed by an Ollama embeddings endpoint
///
/// Each description is embedded separately and the matrix is built from
/// cosine similarities. Embeddings are cached per text, so a rerun over a
/// mostly unchanged population only embeds the new descriptions.
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
    cache: moka::future::Cache<String, Arc<Vec<f64>>>,
}

impl OllamaProvider {
    /// Create a new provider
    ///
    /// `base_url` without a scheme is treated as plain HTTP.
    pub fn new(
        base_url: &str,
        model: String,
        timeout: Duration,
        cache_size: u64,
        cache_ttl: Duration,
    ) -> Result<Self, SimilarityError> {
        let client = Client::builder().timeout(timeout).build()?;

        let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };

        let cache = moka::future::CacheBuilder::new(cache_size)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            base_url,
            model,
            client,
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Embed one text, going to the backend only on a cache miss
    pub async fn embed(&self, text: &str) -> Result<Arc<Vec<f64>>, SimilarityError> {
        if let Some(embedding) = self.cache.get(text).await {
            tracing::trace!("Embedding cache hit ({} chars)", text.len());
            return Ok(embedding);
        }

        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimilarityError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SimilarityError::InvalidResponse(format!("Failed to parse embedding: {}", e)))?;

        if parsed.embedding.is_empty() {
            return Err(SimilarityError::InvalidResponse("Empty embedding".into()));
        }

        let embedding = Arc::new(parsed.embedding);
        self.cache.insert(text.to_string(), embedding.clone()).await;

        Ok(embedding)
    }

    /// Make sure the configured model is present on the backend
    pub async fn pull_model(&self) -> Result<(), SimilarityError> {
        let url = format!("{}/api/pull", self.base_url);

        tracing::info!("Pulling embedding model {} from {}", self.model, self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&PullRequest {
                model: &self.model,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimilarityError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| SimilarityError::InvalidResponse(format!("Failed to parse pull status: {}", e)))?;

        if parsed.status != "success" {
            return Err(SimilarityError::InvalidResponse(format!(
                "Pull finished with status: {}",
                parsed.status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl SimilarityProvider for OllamaProvider {
    async fn score(&self, texts: &[String]) -> Result<SimilarityMatrix, SimilarityError> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            let embedding = self.embed(text).await.map_err(|e| {
                tracing::error!("Failed to embed text {}: {}", i, e);
                e
            })?;
            embeddings.push(embedding.to_vec());
        }

        tracing::debug!("Embedded {} texts with {}", texts.len(), self.model);

        SimilarityMatrix::from_embeddings(&embeddings)
    }
}
