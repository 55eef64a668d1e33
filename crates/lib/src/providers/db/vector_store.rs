//! # Vector Store Contract
//!
//! The interface the search and indexing layers program against. A store
//! backs one or more named collections (vector tables) and exposes the
//! collection lifecycle, document mutation, and the two search shapes.
//!
//! Concurrency: every operation is single-shot request/response; callers
//! may operate on different collections without coordination. Concurrent
//! re-indexing of the *same* owning entity is not serialized here — a
//! caller that can overlap writes for one document must serialize them
//! itself.

use crate::errors::{Outcome, VdbError};
use crate::types::{DatabaseSettings, Row, SimilarityMetric, VectorRecord};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A provider of vector collections over some database backend.
///
/// Every operation accepts an optional `database` targeting a database
/// other than the resolved default.
#[async_trait]
pub trait VectorStore: Send + Sync + Debug + DynClone {
    /// The name of the backend (e.g., "Postgres").
    fn name(&self) -> &str;

    /// Liveness check against the resolved connection.
    async fn ping(&self, database: Option<&str>) -> Result<bool, VdbError>;

    /// Enumerates existing vector collections.
    async fn get_collections(&self, database: Option<&str>) -> Result<Vec<String>, VdbError>;

    /// Creates a collection with the native-field schema and a vector
    /// column of the given dimension.
    ///
    /// Idempotent to the caller: a failing create (typically "already
    /// exists") is absorbed as [`Outcome::Skipped`]. The metric is fixed
    /// per index configuration; this backend applies it at query time.
    async fn create_collection(
        &self,
        collection: &str,
        dimension: u32,
        metric: SimilarityMetric,
        database: Option<&str>,
    ) -> Result<Outcome, VdbError>;

    /// Drops a collection. Absence is absorbed as [`Outcome::Skipped`].
    async fn drop_collection(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<Outcome, VdbError>;

    /// Inserts one embedding chunk. Scalar extra fields land on the main
    /// table; multi-valued extras go to their side tables.
    async fn insert_into_collection(
        &self,
        collection: &str,
        record: VectorRecord,
        database: Option<&str>,
    ) -> Result<(), VdbError>;

    /// Deletes rows by internal row id.
    ///
    /// An empty id list is a no-op and issues no statement. Deletes are
    /// routinely speculative (delete-before-insert), so a failing delete is
    /// absorbed as [`Outcome::Skipped`].
    async fn delete_from_collection(
        &self,
        collection: &str,
        ids: &[i64],
        database: Option<&str>,
    ) -> Result<Outcome, VdbError>;

    /// Resolves owning-entity ids to internal row ids.
    ///
    /// Required because deletion operates on internal ids while callers
    /// think in owning-entity ids.
    async fn get_vdb_ids(
        &self,
        collection: &str,
        owning_ids: &[String],
        database: Option<&str>,
    ) -> Result<Vec<i64>, VdbError>;

    /// Plain relational projection with a pre-assembled filter clause.
    async fn query_search(
        &self,
        collection: &str,
        output_fields: &[String],
        filters: &str,
        limit: u32,
        offset: u32,
        database: Option<&str>,
    ) -> Result<Vec<Row>, VdbError>;

    /// Nearest-neighbor search ordered best-match-first under `metric`,
    /// with the same filter/limit/offset semantics as
    /// [`VectorStore::query_search`].
    #[allow(clippy::too_many_arguments)]
    async fn vector_search(
        &self,
        collection: &str,
        vector: &[f32],
        output_fields: &[String],
        metric: SimilarityMetric,
        filters: &str,
        limit: u32,
        offset: u32,
        database: Option<&str>,
    ) -> Result<Vec<Row>, VdbError>;

    /// Resolve-then-delete convenience: maps owning-entity ids to row ids
    /// and deletes the matches. Entities with no rows are skipped silently.
    async fn delete_items(
        &self,
        settings: &DatabaseSettings,
        item_ids: &[String],
    ) -> Result<(), VdbError> {
        let database = settings.database_name.as_deref();
        let ids = self
            .get_vdb_ids(&settings.collection, item_ids, database)
            .await?;
        if !ids.is_empty() {
            self.delete_from_collection(&settings.collection, &ids, database)
                .await?;
        }
        Ok(())
    }
}

dyn_clone::clone_trait_object!(VectorStore);
