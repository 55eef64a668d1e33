//! # pgvector Client
//!
//! The statement-execution layer of the Postgres provider. Each method
//! takes an already-opened connection, issues one statement (or the short
//! fixed sequence insert needs), and maps driver failures into the typed
//! error for that operation. No retries: partial or duplicate writes under
//! SQL are not safely retryable, so every failure surfaces synchronously.

use super::{escape, sql};
use crate::config::ConnectionData;
use crate::errors::VdbError;
use crate::types::{FieldValue, Row, ScalarValue, SimilarityMetric, VectorRecord};
use serde_json::Value;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

/// Low-level client for a Postgres + pgvector database.
#[derive(Debug, Clone, Default)]
pub struct PgvectorClient;

impl PgvectorClient {
    pub fn new() -> Self {
        Self
    }

    /// Opens a connection for one logical operation.
    ///
    /// The connection task is spawned onto the runtime and winds down when
    /// the returned client is dropped, so scoped acquisition releases the
    /// connection on every exit path.
    pub async fn connect(
        &self,
        data: &ConnectionData,
        database: Option<&str>,
    ) -> Result<Client, VdbError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&data.host)
            .port(data.port)
            .user(&data.username)
            .password(&data.password)
            .dbname(database.unwrap_or(&data.default_database));
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| VdbError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("Postgres connection task ended with error: {e}");
            }
        });
        Ok(client)
    }

    /// Liveness check.
    pub async fn ping(&self, conn: &Client) -> bool {
        conn.simple_query(sql::ping()).await.is_ok()
    }

    /// Issues the schema DDL for a new collection.
    pub async fn create_collection(
        &self,
        conn: &Client,
        collection: &str,
        dimension: u32,
    ) -> Result<(), VdbError> {
        let map_err = |e: tokio_postgres::Error| VdbError::CreateCollection {
            collection: collection.to_string(),
            message: e.to_string(),
        };
        conn.batch_execute(sql::create_vector_extension())
            .await
            .map_err(map_err)?;
        let statement = sql::create_collection(collection, dimension);
        debug!(statement = %statement, "--> Creating collection");
        conn.batch_execute(&statement).await.map_err(map_err)?;
        Ok(())
    }

    pub async fn drop_collection(&self, conn: &Client, collection: &str) -> Result<(), VdbError> {
        let statement = sql::drop_collection(collection);
        debug!(statement = %statement, "--> Dropping collection");
        conn.batch_execute(&statement)
            .await
            .map_err(|e| VdbError::DropCollection {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    pub async fn get_collections(&self, conn: &Client) -> Result<Vec<String>, VdbError> {
        let rows = conn
            .query(sql::list_collections(), &[])
            .await
            .map_err(|e| VdbError::GetCollections(e.to_string()))?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    /// Inserts one record: the main-table row first (growing scalar extra
    /// columns on demand), then one side-table row per value for each
    /// multi-valued extra field.
    pub async fn insert_into_collection(
        &self,
        conn: &Client,
        collection: &str,
        record: &VectorRecord,
    ) -> Result<i64, VdbError> {
        let mut columns: Vec<String> = vec![
            "owning_entity_id".into(),
            "owning_long_id".into(),
            "content".into(),
            "vector".into(),
            "server_id".into(),
            "index_id".into(),
        ];
        let mut values: Vec<String> = vec![
            escape::render_scalar(&ScalarValue::String(record.owning_entity_id.clone())),
            escape::render_scalar(&ScalarValue::String(record.owning_long_id.clone())),
            escape::render_scalar(&ScalarValue::String(record.content.clone())),
            escape::vector_literal(&record.vector),
            escape::render_scalar(&ScalarValue::String(record.server_id.clone())),
            escape::render_scalar(&ScalarValue::String(record.index_id.clone())),
        ];

        for (name, value) in &record.extra_fields {
            if let FieldValue::Scalar(scalar) = value {
                self.add_field_if_not_exists(conn, collection, name, scalar.sql_type())
                    .await?;
                columns.push(name.clone());
                values.push(escape::render_scalar(scalar));
            }
        }

        let statement = sql::insert_row(collection, &columns, &values);
        debug!(collection = %collection, "--> Inserting row");
        let row = conn
            .query_one(&statement, &[])
            .await
            .map_err(|e| VdbError::InsertIntoCollection {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        let chunk_id: i64 = row.get(0);

        for (name, value) in &record.extra_fields {
            if let FieldValue::Multi(items) = value {
                if items.is_empty() {
                    continue;
                }
                let value_type = items[0].sql_type();
                let ddl = sql::create_side_table(collection, name, value_type);
                conn.batch_execute(&ddl)
                    .await
                    .map_err(|e| VdbError::AddFieldIfNotExists {
                        collection: collection.to_string(),
                        field: name.clone(),
                        message: e.to_string(),
                    })?;
                let insert = sql::insert_side_rows(collection, name, chunk_id, items);
                conn.batch_execute(&insert)
                    .await
                    .map_err(|e| VdbError::InsertIntoCollection {
                        collection: collection.to_string(),
                        message: e.to_string(),
                    })?;
            }
        }

        Ok(chunk_id)
    }

    async fn add_field_if_not_exists(
        &self,
        conn: &Client,
        collection: &str,
        field: &str,
        sql_type: &str,
    ) -> Result<(), VdbError> {
        let statement = sql::add_column(collection, field, sql_type);
        conn.batch_execute(&statement)
            .await
            .map_err(|e| VdbError::AddFieldIfNotExists {
                collection: collection.to_string(),
                field: field.to_string(),
                message: e.to_string(),
            })
    }

    /// Deletes rows by internal id, returning the number of rows removed.
    pub async fn delete_from_collection(
        &self,
        conn: &Client,
        collection: &str,
        ids: &[i64],
    ) -> Result<u64, VdbError> {
        let statement = sql::delete_rows(collection, ids);
        debug!(statement = %statement, "--> Deleting rows");
        conn.execute(&statement, &[])
            .await
            .map_err(|e| VdbError::DeleteFromCollection {
                collection: collection.to_string(),
                message: e.to_string(),
            })
    }

    pub async fn query_search(
        &self,
        conn: &Client,
        collection: &str,
        output_fields: &[String],
        filters: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Row>, VdbError> {
        let statement = sql::query_search(collection, output_fields, filters, limit, offset);
        debug!(statement = %statement, "--> Executing query search");
        let rows = conn
            .query(&statement, &[])
            .await
            .map_err(|e| VdbError::QuerySearch {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn vector_search(
        &self,
        conn: &Client,
        collection: &str,
        vector: &[f32],
        output_fields: &[String],
        metric: SimilarityMetric,
        filters: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Row>, VdbError> {
        let statement =
            sql::vector_search(collection, vector, output_fields, metric, filters, limit, offset);
        debug!(statement = %statement, "--> Executing vector search");
        let rows = conn
            .query(&statement, &[])
            .await
            .map_err(|e| VdbError::VectorSearch {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Converts a driver row into a JSON object keyed by column name.
fn row_to_json(row: &tokio_postgres::Row) -> Row {
    let mut map = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), column_to_json(row, i));
    }
    map
}

fn column_to_json(row: &tokio_postgres::Row, index: usize) -> Value {
    let ty = row.columns()[index].type_();
    if *ty == Type::INT8 {
        match row.try_get::<_, Option<i64>>(index) {
            Ok(Some(v)) => Value::from(v),
            _ => Value::Null,
        }
    } else if *ty == Type::INT4 {
        match row.try_get::<_, Option<i32>>(index) {
            Ok(Some(v)) => Value::from(v),
            _ => Value::Null,
        }
    } else if *ty == Type::FLOAT8 {
        match row.try_get::<_, Option<f64>>(index) {
            Ok(Some(v)) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    } else if *ty == Type::FLOAT4 {
        match row.try_get::<_, Option<f32>>(index) {
            Ok(Some(v)) => serde_json::Number::from_f64(f64::from(v))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    } else if *ty == Type::BOOL {
        match row.try_get::<_, Option<bool>>(index) {
            Ok(Some(v)) => Value::Bool(v),
            _ => Value::Null,
        }
    } else {
        // TEXT and VARCHAR decode as strings; types the driver cannot
        // decode (the vector column among them) come back as null.
        match row.try_get::<_, Option<String>>(index) {
            Ok(Some(v)) => Value::String(v),
            _ => Value::Null,
        }
    }
}
