pub mod embedding;

pub use embedding::{generate_embedding, EmbeddingError, EmbeddingStrategy, HttpEmbeddingStrategy};
