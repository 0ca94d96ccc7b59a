use anyhow::Result;

/// A slice of a source document, ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    pub chunk_index: usize,
    pub token_offset: usize,
}

/// Chunk sizing in whitespace tokens.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub overlap_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap_size: 100,
        }
    }
}

/// Splits text into overlapping token windows so neighbouring chunks share
/// context at their boundary.
#[derive(Debug)]
pub struct TextChunker {
    config: ChunkConfig,
}

impl TextChunker {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        if config.overlap_size >= config.chunk_size {
            anyhow::bail!(
                "overlap size {} must be smaller than chunk size {}",
                config.overlap_size,
                config.chunk_size
            );
        }
        Ok(Self { config })
    }

    pub fn chunk_text(&self, text: &str) -> Vec<TextChunk> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return vec![];
        }

        if tokens.len() <= self.config.chunk_size {
            return vec![TextChunk {
                content: text.trim().to_string(),
                chunk_index: 0,
                token_offset: 0,
            }];
        }

        let step = self.config.chunk_size - self.config.overlap_size;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < tokens.len() {
            let end = (start + self.config.chunk_size).min(tokens.len());
            chunks.push(TextChunk {
                content: tokens[start..end].join(" "),
                chunk_index: chunks.len(),
                token_offset: start,
            });

            if end == tokens.len() {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Whitespace-token count, the unit the chunk sizes are expressed in.
    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
