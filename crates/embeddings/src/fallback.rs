use anyhow::Result;

/// Deterministic offline provider used when no embedding endpoint is
/// configured. Vectors are derived from the text content so distinct inputs
/// map to distinct embeddings, which keeps similarity search exercisable in
/// development.
pub struct FallbackEmbeddingProvider {
    embedding_dim: usize,
}

impl FallbackEmbeddingProvider {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Provider sized to the vector schema (1536).
    pub fn with_schema_dimension() -> Self {
        Self::new(1536)
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let embeddings = texts
            .iter()
            .enumerate()
            .map(|(i, text)| self.embed_one(i, text))
            .collect();

        Ok(embeddings)
    }

    fn embed_one(&self, index: usize, text: &str) -> Vec<f32> {
        // Cheap byte-rolling hash spread across the vector; stable per text
        let mut state: u32 = 2166136261;
        for byte in text.bytes() {
            state = state.wrapping_mul(16777619) ^ byte as u32;
        }

        (0..self.embedding_dim)
            .map(|dim| {
                let mixed = state
                    .wrapping_add(dim as u32)
                    .wrapping_mul(2654435761)
                    .wrapping_add(index as u32);
                ((mixed % 2000) as f32 / 1000.0) - 1.0
            })
            .collect()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }
}
