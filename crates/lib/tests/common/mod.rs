#![allow(dead_code)]
//! Shared test helpers: an in-memory [`VectorStore`] that records every
//! call, so orchestrator and contract semantics can be verified without a
//! live Postgres server.

use anyvec::errors::{Outcome, VdbError, VdbWarning};
use anyvec::types::{Row, SimilarityMetric, VectorRecord};
use anyvec::VectorStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::init();
    });
}

/// One stored chunk row with its generated internal id.
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub id: i64,
    pub record: VectorRecord,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    collections: HashMap<String, Vec<StoredRow>>,
    calls: Vec<String>,
}

/// An in-memory vector store implementing the full [`VectorStore`]
/// contract, including the idempotency semantics of the lifecycle
/// operations. Vector search ranks by real distance math so ordering
/// properties can be asserted against fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryVectorStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The journal of operations, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// All rows currently stored in a collection.
    pub fn rows(&self, collection: &str) -> Vec<StoredRow> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

fn distance(metric: SimilarityMetric, a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    match metric {
        SimilarityMetric::Cosine => {
            let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
            let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                1.0
            } else {
                1.0 - dot / (norm_a * norm_b)
            }
        }
        SimilarityMetric::DotProduct => -dot,
        SimilarityMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
            .sum::<f64>()
            .sqrt(),
    }
}

fn project(row: &StoredRow, output_fields: &[String]) -> Row {
    let mut map = Row::new();
    for field in output_fields {
        let value = match field.as_str() {
            "id" => Value::from(row.id),
            "owning_entity_id" => Value::String(row.record.owning_entity_id.clone()),
            "owning_long_id" => Value::String(row.record.owning_long_id.clone()),
            "content" => Value::String(row.record.content.clone()),
            "server_id" => Value::String(row.record.server_id.clone()),
            "index_id" => Value::String(row.record.index_id.clone()),
            _ => Value::Null,
        };
        map.insert(field.clone(), value);
    }
    map
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn name(&self) -> &str {
        "Memory"
    }

    async fn ping(&self, _database: Option<&str>) -> Result<bool, VdbError> {
        Ok(true)
    }

    async fn get_collections(&self, _database: Option<&str>) -> Result<Vec<String>, VdbError> {
        let state = self.state.lock().unwrap();
        Ok(state.collections.keys().cloned().collect())
    }

    async fn create_collection(
        &self,
        collection: &str,
        _dimension: u32,
        _metric: SimilarityMetric,
        _database: Option<&str>,
    ) -> Result<Outcome, VdbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_collection:{collection}"));
        if state.collections.contains_key(collection) {
            return Ok(Outcome::Skipped(VdbWarning::CreateCollection(format!(
                "relation \"{collection}\" already exists"
            ))));
        }
        state.collections.insert(collection.to_string(), Vec::new());
        Ok(Outcome::Applied)
    }

    async fn drop_collection(
        &self,
        collection: &str,
        _database: Option<&str>,
    ) -> Result<Outcome, VdbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("drop_collection:{collection}"));
        if state.collections.remove(collection).is_none() {
            return Ok(Outcome::Skipped(VdbWarning::DropCollection(format!(
                "table \"{collection}\" does not exist"
            ))));
        }
        Ok(Outcome::Applied)
    }

    async fn insert_into_collection(
        &self,
        collection: &str,
        record: VectorRecord,
        _database: Option<&str>,
    ) -> Result<(), VdbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!(
            "insert:{collection}:{}",
            record.owning_entity_id
        ));
        state.next_id += 1;
        let id = state.next_id;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredRow { id, record });
        Ok(())
    }

    async fn delete_from_collection(
        &self,
        collection: &str,
        ids: &[i64],
        _database: Option<&str>,
    ) -> Result<Outcome, VdbError> {
        if ids.is_empty() {
            return Ok(Outcome::Applied);
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete:{collection}:{ids:?}"));
        if let Some(rows) = state.collections.get_mut(collection) {
            rows.retain(|row| !ids.contains(&row.id));
        }
        Ok(Outcome::Applied)
    }

    async fn get_vdb_ids(
        &self,
        collection: &str,
        owning_ids: &[String],
        _database: Option<&str>,
    ) -> Result<Vec<i64>, VdbError> {
        if owning_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("get_vdb_ids:{collection}:{owning_ids:?}"));
        Ok(state
            .collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| owning_ids.contains(&row.record.owning_entity_id))
                    .map(|row| row.id)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_search(
        &self,
        collection: &str,
        output_fields: &[String],
        _filters: &str,
        limit: u32,
        offset: u32,
        _database: Option<&str>,
    ) -> Result<Vec<Row>, VdbError> {
        let state = self.state.lock().unwrap();
        let rows = state.collections.get(collection).cloned().unwrap_or_default();
        Ok(rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| project(row, output_fields))
            .collect())
    }

    async fn vector_search(
        &self,
        collection: &str,
        vector: &[f32],
        output_fields: &[String],
        metric: SimilarityMetric,
        _filters: &str,
        limit: u32,
        offset: u32,
        _database: Option<&str>,
    ) -> Result<Vec<Row>, VdbError> {
        let state = self.state.lock().unwrap();
        let mut rows = state.collections.get(collection).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let da = distance(metric, &a.record.vector, vector);
            let db = distance(metric, &b.record.vector, vector);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|row| {
                let mut projected = project(row, output_fields);
                let d = distance(metric, &row.record.vector, vector);
                projected.insert(
                    "distance".to_string(),
                    serde_json::Number::from_f64(d)
                        .map(Value::Number)
                        .unwrap_or(Value::Null),
                );
                projected
            })
            .collect())
    }
}
