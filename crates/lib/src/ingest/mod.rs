//! # Indexing Orchestrator
//!
//! Drives one indexing pass: deletes any existing rows for the batch's
//! owning entities (delete-before-insert — rows are never updated in
//! place), asks the embedding producer for each document's chunks,
//! validates chunk shape, splits metadata into native and extra fields,
//! and inserts one row per chunk.
//!
//! A document whose embedding retrieval fails is omitted from the returned
//! ids; the caller reconciles. Concurrent re-indexing of the same owning
//! entity is a caller obligation to serialize.

use crate::errors::VdbError;
use crate::providers::ai::embedding::EmbeddingStrategy;
use crate::providers::db::vector_store::VectorStore;
use crate::types::{
    is_native_field, ChunkEmbedding, DatabaseSettings, FieldValue, IndexSchema, ScalarValue,
    SourceDocument, VectorRecord,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Configuration driving one indexing pass.
#[derive(Debug, Clone)]
pub struct IndexingConfig {
    pub database_settings: DatabaseSettings,
    /// Identifier of the embeddings engine handed to the producer.
    pub embeddings_engine: String,
    /// Model identifier handed to the producer.
    pub embedding_model: String,
    /// Opaque strategy configuration, interpreted by the producer.
    pub strategy_config: Value,
}

/// Indexes a batch of source documents into the configured collection.
///
/// Returns the owning ids that were fully processed. Embedding failures
/// drop the document from the result; store failures abort the pass, since
/// continuing after a failed write would leave the caller unable to tell
/// which documents landed.
pub async fn index_items(
    store: &dyn VectorStore,
    config: &IndexingConfig,
    index: &dyn IndexSchema,
    items: &[SourceDocument],
    strategy: &dyn EmbeddingStrategy,
) -> Result<Vec<String>, VdbError> {
    let mut successful_ids = Vec::new();

    // Existing rows for these entities must go first; there is no partial
    // update of a chunk row.
    let owning_ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();
    store
        .delete_items(&config.database_settings, &owning_ids)
        .await?;

    let database = config.database_settings.database_name.as_deref();
    for item in items {
        let embeddings = match strategy
            .get_embedding(
                &config.embeddings_engine,
                &config.embedding_model,
                &config.strategy_config,
                &item.fields,
                item,
                index,
            )
            .await
        {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(item = %item.id, "Embedding retrieval failed, skipping item: {e}");
                continue;
            }
        };

        for embedding in embeddings {
            validate_embedding(&embedding)?;
            let record = build_record(item, index, &embedding);
            store
                .insert_into_collection(&config.database_settings.collection, record, database)
                .await?;
        }

        successful_ids.push(item.id.clone());
    }

    Ok(successful_ids)
}

/// Enforces the embedding shape contract: a chunk id, a non-empty vector,
/// and a metadata map (always present on the typed struct).
fn validate_embedding(embedding: &ChunkEmbedding) -> Result<(), VdbError> {
    if embedding.id.is_empty() {
        return Err(VdbError::MalformedEmbedding(
            "chunk is missing an id".to_string(),
        ));
    }
    if embedding.values.is_empty() {
        return Err(VdbError::MalformedEmbedding(format!(
            "chunk `{}` has an empty vector",
            embedding.id
        )));
    }
    Ok(())
}

/// Converts one validated chunk into a record, splitting metadata into
/// native and extra fields by the reserved-name set.
fn build_record(
    item: &SourceDocument,
    index: &dyn IndexSchema,
    embedding: &ChunkEmbedding,
) -> VectorRecord {
    let mut record = VectorRecord {
        owning_entity_id: item.id.clone(),
        owning_long_id: embedding.id.clone(),
        content: String::new(),
        vector: embedding.values.clone(),
        server_id: index.server_id().to_string(),
        index_id: index.index_id().to_string(),
        extra_fields: HashMap::new(),
    };

    for (key, value) in &embedding.metadata {
        if key == "content" {
            if let Value::String(text) = value {
                record.content = text.clone();
            }
            continue;
        }
        // Remaining native names (vector, ids, server/index) are already
        // stamped; metadata cannot override them.
        if is_native_field(key) {
            continue;
        }
        let is_multiple = index.field(key).map(|f| f.is_multiple).unwrap_or(false);
        if let Some(field_value) = field_value_from_json(value, is_multiple) {
            record.extra_fields.insert(key.clone(), field_value);
        }
    }

    record
}

fn field_value_from_json(value: &Value, is_multiple: bool) -> Option<FieldValue> {
    match value {
        Value::Array(items) => {
            let scalars: Vec<ScalarValue> = items.iter().filter_map(scalar_from_json).collect();
            Some(FieldValue::Multi(scalars))
        }
        _ => {
            let scalar = scalar_from_json(value)?;
            if is_multiple {
                Some(FieldValue::Multi(vec![scalar]))
            } else {
                Some(FieldValue::Scalar(scalar))
            }
        }
    }
}

fn scalar_from_json(value: &Value) -> Option<ScalarValue> {
    match value {
        Value::String(s) => Some(ScalarValue::String(s.clone())),
        Value::Bool(b) => Some(ScalarValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(ScalarValue::Integer(i))
            } else {
                n.as_f64().map(ScalarValue::Float)
            }
        }
        _ => None,
    }
}
