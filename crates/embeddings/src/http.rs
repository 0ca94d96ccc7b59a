use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a text-embeddings-inference style HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingConfig {
    pub endpoint: String,
    pub model: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpEmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            model: None,
            dimension: 1536,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    // text-embeddings-inference returns a bare array of vectors
    Plain(Vec<Vec<f32>>),
    // some servers wrap it in an object
    Wrapped { embeddings: Vec<Vec<f32>> },
}

impl EmbedResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            EmbedResponse::Plain(v) => v,
            EmbedResponse::Wrapped { embeddings } => embeddings,
        }
    }
}

pub struct HttpEmbeddingClient {
    config: HttpEmbeddingConfig,
    client: Client,
}

impl HttpEmbeddingClient {
    pub fn new(config: HttpEmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Embed a batch, retrying transient failures with exponential backoff.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.try_embed(&texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_millis(1000 * (2_u64.pow(attempt)));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("embedding request failed with no attempts made")))
    }

    async fn try_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embed", self.config.endpoint.trim_end_matches('/'));
        let request = EmbedRequest {
            inputs: texts,
            model: self.config.model.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Embedding request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding endpoint returned {}: {}", status, body);
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;
        let embeddings = parsed.into_vectors();

        if embeddings.len() != texts.len() {
            anyhow::bail!(
                "Embedding count mismatch: sent {} texts, got {} vectors",
                texts.len(),
                embeddings.len()
            );
        }
        for embedding in &embeddings {
            if embedding.len() != self.config.dimension {
                anyhow::bail!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.config.dimension,
                    embedding.len()
                );
            }
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_create_client_with_default_config() {
        let client = HttpEmbeddingClient::new(HttpEmbeddingConfig::default()).unwrap();
        assert_eq!(client.dimension(), 1536);
    }

    #[tokio::test]
    async fn should_return_empty_result_for_empty_input() {
        let client = HttpEmbeddingClient::new(HttpEmbeddingConfig::default()).unwrap();
        let result = client.embed(vec![]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn should_fail_against_unreachable_endpoint() {
        let config = HttpEmbeddingConfig {
            endpoint: "http://localhost:1".to_string(),
            timeout_secs: 1,
            max_retries: 0,
            ..HttpEmbeddingConfig::default()
        };
        let client = HttpEmbeddingClient::new(config).unwrap();

        let result = client.embed(vec!["text".to_string()]).await;
        assert!(result.is_err());
    }

    #[test]
    fn should_parse_both_response_shapes() {
        let plain: EmbedResponse = serde_json::from_str("[[0.1, 0.2], [0.3, 0.4]]").unwrap();
        assert_eq!(plain.into_vectors().len(), 2);

        let wrapped: EmbedResponse =
            serde_json::from_str(r#"{"embeddings": [[0.5, 0.6]]}"#).unwrap();
        assert_eq!(wrapped.into_vectors(), vec![vec![0.5, 0.6]]);
    }

    #[test]
    fn should_omit_model_field_when_not_configured() {
        let texts = vec!["hello".to_string()];
        let request = EmbedRequest {
            inputs: &texts,
            model: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"inputs":["hello"]}"#);
    }
}
