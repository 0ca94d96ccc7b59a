use std::time::Duration;

use anyhow::{Context, Result};
use cache::RedisCache;
use embeddings::{ChunkConfig, EmbeddingProvider, TextChunker};
use jobs::{BrokerConfig, JobQueue, QueueConfig};
use mindbridge_core::Config;
use vector_store::{DatabaseHealthChecker, VectorStore};

use crate::metrics::Metrics;

/// Everything the handlers need, built once at startup.
pub struct AppState {
    pub store: VectorStore,
    pub cache: RedisCache,
    pub queue: JobQueue,
    pub embedder: Box<dyn EmbeddingProvider>,
    pub chunker: TextChunker,
    pub metrics: Metrics,
}

impl AppState {
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        let dimension = config.embedding.dimension_or_default();

        let store = VectorStore::connect(&config.database, dimension)
            .await
            .context("Failed to initialize vector store")?;

        let cache = RedisCache::new(
            &config.redis.url,
            Duration::from_secs(config.redis.ttl_seconds),
        )
        .context("Failed to initialize Redis cache")?;

        let broker = BrokerConfig::from_settings(&config.jobs, &config.redis.url)
            .context("Failed to build broker configuration")?;
        let queue = JobQueue::new(&broker, QueueConfig::default())
            .context("Failed to initialize job queue")?;

        let embedder = embeddings::create_embedding_provider(&config.embedding)
            .context("Failed to create embedding provider")?;

        let chunker = TextChunker::new(ChunkConfig::default())
            .context("Failed to configure text chunker")?;

        let metrics = Metrics::new()?;

        tracing::info!(
            dimension,
            provider = %config.embedding.provider,
            "application state initialized"
        );

        Ok(Self {
            store,
            cache,
            queue,
            embedder,
            chunker,
            metrics,
        })
    }

    pub fn health_checker(&self) -> DatabaseHealthChecker {
        DatabaseHealthChecker::new(self.store.pool().clone())
    }
}
