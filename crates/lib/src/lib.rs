//! # anyvec
//!
//! A pluggable vector-database layer: named collections of embedding
//! chunks behind a generic [`VectorStore`] contract, with a Postgres +
//! pgvector backend, a condition-tree-to-SQL filter compiler, and an
//! indexing orchestrator that turns source documents into vector rows.
//!
//! The provider renders every statement itself — escaping is this crate's
//! responsibility, not the driver's — and speaks plain SQL over a
//! per-operation connection.

pub mod config;
pub mod errors;
pub mod filter;
pub mod ingest;
pub mod providers;
pub mod types;

pub use config::{ConnectionData, ConnectionOverrides, ConnectionSettings, SecretStore};
pub use errors::{Outcome, VdbError, VdbWarning};
pub use filter::CompiledFilter;
pub use providers::ai::embedding::{EmbeddingStrategy, HttpEmbeddingStrategy};
pub use providers::db::postgres::PostgresProvider;
pub use providers::db::vector_store::VectorStore;
pub use types::SimilarityMetric;
