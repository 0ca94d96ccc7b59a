pub mod chunker;
pub mod fallback;
pub mod http;

pub use chunker::{ChunkConfig, TextChunk, TextChunker};
pub use fallback::FallbackEmbeddingProvider;
pub use http::{HttpEmbeddingClient, HttpEmbeddingConfig};

use anyhow::Result;
use mindbridge_core::config::EmbeddingConfig;

type EmbedFuture<'a> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;

/// Anything that can turn a batch of texts into fixed-width vectors.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_>;
    fn dimension(&self) -> usize;
}

impl EmbeddingProvider for HttpEmbeddingClient {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.dimension()
    }
}

impl EmbeddingProvider for FallbackEmbeddingProvider {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.embedding_dimension()
    }
}

/// Build a provider from configuration. Unknown providers get the
/// deterministic offline fallback so the service still comes up.
pub fn create_embedding_provider(cfg: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let dimension = cfg.dimension_or_default();

    match cfg.provider.as_str() {
        "http" => {
            let endpoint = cfg
                .endpoint
                .clone()
                .ok_or_else(|| anyhow::anyhow!("http embedding provider requires an endpoint"))?;
            let http_cfg = HttpEmbeddingConfig {
                endpoint,
                model: cfg.model.clone(),
                dimension,
                ..HttpEmbeddingConfig::default()
            };
            Ok(Box::new(HttpEmbeddingClient::new(http_cfg)?))
        }
        other => {
            if other != "fallback" {
                tracing::warn!(provider = other, "unknown embedding provider, using fallback");
            }
            Ok(Box::new(FallbackEmbeddingProvider::new(dimension)))
        }
    }
}
