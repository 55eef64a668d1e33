//! # Embedding Producer
//!
//! The contract for turning source documents into embedding chunks, plus an
//! implementation that calls an external, OpenAI-compatible embeddings API.

use crate::types::{ChunkEmbedding, FieldValue, IndexSchema, ScalarValue, SourceDocument};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors from the embedding producer.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to send request to embeddings API: {0}")]
    Request(reqwest::Error),
    #[error("Embeddings API returned an error: {0}")]
    Api(String),
    #[error("Failed to deserialize embeddings API response: {0}")]
    Deserialization(reqwest::Error),
    #[error("Embeddings API returned no embedding data")]
    EmptyResponse,
}

/// Produces embedding chunks for one source document.
///
/// Implementations decide how a document's fields become chunks; the
/// orchestrator only requires that every returned chunk carries an id, a
/// vector, and a metadata map.
#[async_trait]
pub trait EmbeddingStrategy: Send + Sync {
    async fn get_embedding(
        &self,
        engine: &str,
        model: &str,
        strategy_config: &Value,
        fields: &HashMap<String, FieldValue>,
        document: &SourceDocument,
        index: &dyn IndexSchema,
    ) -> Result<Vec<ChunkEmbedding>, EmbeddingError>;
}

#[derive(Serialize, Debug)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize, Debug)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

/// Generates a vector embedding for a text input using an external
/// OpenAI-compatible API.
pub async fn generate_embedding(
    api_url: &str,
    model: &str,
    input: &str,
    api_key: Option<&str>,
) -> Result<Vec<f32>, EmbeddingError> {
    let client = ReqwestClient::new();
    let request_body = OpenAiEmbeddingRequest { model, input };
    debug!(payload = ?request_body, "--> Sending request to embeddings API");

    let mut request_builder = client.post(api_url).json(&request_body);
    if let Some(key) = api_key {
        request_builder = request_builder.bearer_auth(key);
    }

    let response = request_builder
        .send()
        .await
        .map_err(EmbeddingError::Request)?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(EmbeddingError::Api(error_text));
    }

    let parsed: OpenAiEmbeddingResponse = response
        .json()
        .await
        .map_err(EmbeddingError::Deserialization)?;
    parsed
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or(EmbeddingError::EmptyResponse)
}

/// An [`EmbeddingStrategy`] that embeds each document as a single chunk via
/// an OpenAI-compatible HTTP endpoint.
///
/// The chunk's text is the concatenation of the document's textual fields;
/// every document field is carried into the chunk metadata so the indexer
/// can persist it alongside the vector.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingStrategy {
    api_url: String,
    api_key: Option<String>,
}

impl HttpEmbeddingStrategy {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
        }
    }

    fn document_text(fields: &HashMap<String, FieldValue>) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();
        for name in names {
            match &fields[name] {
                FieldValue::Scalar(ScalarValue::String(s)) if !s.is_empty() => {
                    parts.push(s.clone());
                }
                FieldValue::Multi(values) => {
                    for value in values {
                        if let ScalarValue::String(s) = value {
                            if !s.is_empty() {
                                parts.push(s.clone());
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        parts.join("\n")
    }
}

#[async_trait]
impl EmbeddingStrategy for HttpEmbeddingStrategy {
    async fn get_embedding(
        &self,
        _engine: &str,
        model: &str,
        _strategy_config: &Value,
        fields: &HashMap<String, FieldValue>,
        document: &SourceDocument,
        _index: &dyn IndexSchema,
    ) -> Result<Vec<ChunkEmbedding>, EmbeddingError> {
        let content = Self::document_text(fields);
        let values =
            generate_embedding(&self.api_url, model, &content, self.api_key.as_deref()).await?;

        let mut metadata = serde_json::Map::new();
        metadata.insert("content".to_string(), Value::String(content));
        for (name, value) in fields {
            metadata.insert(
                name.clone(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }

        Ok(vec![ChunkEmbedding {
            id: format!("{}:0", document.id),
            values,
            metadata,
        }])
    }
}
