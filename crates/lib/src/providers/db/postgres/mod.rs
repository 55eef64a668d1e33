//! # Postgres + pgvector Provider
//!
//! The policy layer over [`client::PgvectorClient`]: resolves credentials
//! per operation, applies the idempotency contract of the collection
//! lifecycle (swallow-and-log for benign statement failures), short-circuits
//! empty inputs before any connection is made, and compiles condition trees
//! into filter clauses for the search operations.

use crate::config::{
    resolve_connection, ConnectionData, ConnectionOverrides, ConnectionSettings, SecretStore,
};
use crate::errors::{Outcome, VdbError, VdbWarning};
use crate::filter::{self, CompiledFilter};
use crate::providers::db::vector_store::VectorStore;
use crate::types::{
    is_native_field, ConditionGroup, IndexSchema, Row, SimilarityMetric, VectorRecord,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::Client;
use tracing::warn;

pub mod client;
pub mod escape;
pub mod sql;

use client::PgvectorClient;

/// Vector store backed by Postgres with the pgvector extension.
///
/// Cloning shares the secret store; each logical operation resolves the
/// connection parameters and opens its own scoped connection.
#[derive(Clone)]
pub struct PostgresProvider {
    settings: ConnectionSettings,
    overrides: ConnectionOverrides,
    secrets: Arc<dyn SecretStore>,
    client: PgvectorClient,
}

impl fmt::Debug for PostgresProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresProvider")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PostgresProvider {
    pub fn new(settings: ConnectionSettings, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            settings,
            overrides: ConnectionOverrides::default(),
            secrets,
            client: PgvectorClient::new(),
        }
    }

    /// Applies explicit per-call settings that take precedence over the
    /// persisted configuration.
    pub fn with_overrides(mut self, overrides: ConnectionOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Whether a persisted host exists, i.e. the provider has been set up
    /// at all. Does not validate the remaining fields.
    pub fn is_setup(&self) -> bool {
        self.settings.host.as_deref().is_some_and(|h| !h.is_empty())
    }

    /// Resolves the connection parameters without connecting.
    pub fn get_connection_data(&self) -> Result<ConnectionData, VdbError> {
        resolve_connection(&self.overrides, &self.settings, self.secrets.as_ref())
    }

    async fn connection(&self, database: Option<&str>) -> Result<Client, VdbError> {
        let data = self.get_connection_data()?;
        self.client.connect(&data, database).await
    }

    /// Compiles a condition tree into the filter clause for this
    /// collection, logging any leaves the compiler dropped.
    pub fn prepare_filters(
        &self,
        schema: &dyn IndexSchema,
        collection: &str,
        group: &ConditionGroup,
    ) -> CompiledFilter {
        let compiled = filter::compile(schema, collection, group);
        for warning in &compiled.warnings {
            warn!("{warning}");
        }
        compiled
    }
}

#[async_trait]
impl VectorStore for PostgresProvider {
    fn name(&self) -> &str {
        "Postgres"
    }

    async fn ping(&self, database: Option<&str>) -> Result<bool, VdbError> {
        let conn = self.connection(database).await?;
        Ok(self.client.ping(&conn).await)
    }

    async fn get_collections(&self, database: Option<&str>) -> Result<Vec<String>, VdbError> {
        let conn = self.connection(database).await?;
        self.client.get_collections(&conn).await
    }

    async fn create_collection(
        &self,
        collection: &str,
        dimension: u32,
        _metric: SimilarityMetric,
        database: Option<&str>,
    ) -> Result<Outcome, VdbError> {
        let conn = self.connection(database).await?;
        match self
            .client
            .create_collection(&conn, collection, dimension)
            .await
        {
            Ok(()) => Ok(Outcome::Applied),
            // A create can fail in valid scenarios: if an index is cleared
            // before its first indexing pass, the collection may already
            // exist from a previous run or not be creatable yet.
            Err(VdbError::CreateCollection { message, .. }) => {
                let warning = VdbWarning::CreateCollection(message);
                warn!("{warning}");
                Ok(Outcome::Skipped(warning))
            }
            Err(e) => Err(e),
        }
    }

    async fn drop_collection(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<Outcome, VdbError> {
        let conn = self.connection(database).await?;
        match self.client.drop_collection(&conn, collection).await {
            Ok(()) => Ok(Outcome::Applied),
            // Clearing an index drops its collection even when the
            // collection was never created; absence is not a failure.
            Err(VdbError::DropCollection { message, .. }) => {
                let warning = VdbWarning::DropCollection(message);
                warn!("{warning}");
                Ok(Outcome::Skipped(warning))
            }
            Err(e) => Err(e),
        }
    }

    async fn insert_into_collection(
        &self,
        collection: &str,
        record: VectorRecord,
        database: Option<&str>,
    ) -> Result<(), VdbError> {
        for name in record.extra_fields.keys() {
            if is_native_field(name) {
                return Err(VdbError::ReservedFieldName(name.clone()));
            }
        }
        let conn = self.connection(database).await?;
        self.client
            .insert_into_collection(&conn, collection, &record)
            .await?;
        Ok(())
    }

    async fn delete_from_collection(
        &self,
        collection: &str,
        ids: &[i64],
        database: Option<&str>,
    ) -> Result<Outcome, VdbError> {
        // No-op before any connection or resolution work happens.
        if ids.is_empty() {
            return Ok(Outcome::Applied);
        }
        let conn = self.connection(database).await?;
        match self
            .client
            .delete_from_collection(&conn, collection, ids)
            .await
        {
            Ok(0) => {
                // Deletes run speculatively before re-insertion, so the
                // rows frequently do not exist yet.
                warn!(
                    collection = %collection,
                    "Delete matched no rows in collection"
                );
                Ok(Outcome::Applied)
            }
            Ok(_) => Ok(Outcome::Applied),
            Err(VdbError::DeleteFromCollection { message, .. }) => {
                let warning = VdbWarning::DeleteFromCollection(message);
                warn!("{warning}");
                Ok(Outcome::Skipped(warning))
            }
            Err(e) => Err(e),
        }
    }

    async fn get_vdb_ids(
        &self,
        collection: &str,
        owning_ids: &[String],
        database: Option<&str>,
    ) -> Result<Vec<i64>, VdbError> {
        if owning_ids.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<crate::types::ScalarValue> = owning_ids
            .iter()
            .map(|id| crate::types::ScalarValue::String(id.clone()))
            .collect();
        let prepared = escape::prepare_string_array(&values);
        let filters = format!("WHERE owning_entity_id IN {prepared}");
        // Every chunk for the requested entities, not a result page.
        let rows = self
            .query_search(
                collection,
                &["id".to_string()],
                &filters,
                u32::MAX,
                0,
                database,
            )
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("id").and_then(|v| v.as_i64()))
            .collect())
    }

    async fn query_search(
        &self,
        collection: &str,
        output_fields: &[String],
        filters: &str,
        limit: u32,
        offset: u32,
        database: Option<&str>,
    ) -> Result<Vec<Row>, VdbError> {
        let conn = self.connection(database).await?;
        self.client
            .query_search(&conn, collection, output_fields, filters, limit, offset)
            .await
    }

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
    ) -> Result<Vec<Row>, VdbError> {
        let conn = self.connection(database).await?;
        self.client
            .vector_search(
                &conn,
                collection,
                vector,
                output_fields,
                metric,
                filters,
                limit,
                offset,
            )
            .await
    }
}
