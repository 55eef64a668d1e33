//! # Postgres Statement Builders
//!
//! Centralizes the SQL text for the pgvector provider as pure functions, so
//! the statement shapes stay testable without a database and the execution
//! layer stays clean. All interpolated identifiers and values are expected
//! to be pre-rendered through [`super::escape`].

use super::escape::{escape_identifier, render_scalar, vector_literal};
use crate::types::{ScalarValue, SimilarityMetric};

/// The pgvector extension must exist before any vector column can.
pub fn create_vector_extension() -> &'static str {
    "CREATE EXTENSION IF NOT EXISTS vector"
}

/// DDL for a new collection with the fixed native-field schema.
///
/// Deliberately not `IF NOT EXISTS`: the provider treats a failing create
/// as benign, and the error keeps the statement honest in logs.
pub fn create_collection(collection: &str, dimension: u32) -> String {
    let table = escape_identifier(collection);
    format!(
        "CREATE TABLE {table} (\
         id BIGSERIAL PRIMARY KEY, \
         owning_entity_id TEXT NOT NULL, \
         owning_long_id TEXT NOT NULL, \
         content TEXT, \
         vector vector({dimension}), \
         server_id TEXT, \
         index_id TEXT)"
    )
}

pub fn drop_collection(collection: &str) -> String {
    format!("DROP TABLE {}", escape_identifier(collection))
}

/// Enumerates tables carrying a pgvector column.
pub fn list_collections() -> &'static str {
    "SELECT DISTINCT table_name FROM information_schema.columns \
     WHERE table_schema = 'public' AND udt_name = 'vector'"
}

pub fn ping() -> &'static str {
    "SELECT 1"
}

/// The physical name of the side table holding a multi-valued extra field.
///
/// The naming convention is the contract between insert and filter
/// compilation, so it lives in exactly one place.
pub fn side_table_name(collection: &str, field_identifier: &str) -> String {
    format!("{collection}__{field_identifier}")
}

/// DDL for a multi-valued field's side table, keyed back to the parent row.
pub fn create_side_table(collection: &str, field_identifier: &str, value_type: &str) -> String {
    let side = escape_identifier(&side_table_name(collection, field_identifier));
    format!("CREATE TABLE IF NOT EXISTS {side} (chunk_id BIGINT NOT NULL, value {value_type})")
}

/// Adds a scalar extra-field column on demand at index time.
pub fn add_column(collection: &str, field_identifier: &str, sql_type: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {sql_type}",
        escape_identifier(collection),
        escape_identifier(field_identifier)
    )
}

/// Inserts one main-table row and returns its generated id.
///
/// `columns` are raw column names; `rendered_values` must already be
/// escaped literals or machine-typed renderings, positionally matched.
pub fn insert_row(collection: &str, columns: &[String], rendered_values: &[String]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| escape_identifier(c)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
        escape_identifier(collection),
        cols.join(", "),
        rendered_values.join(", ")
    )
}

/// Inserts the values of one multi-valued field, one row per value.
pub fn insert_side_rows(
    collection: &str,
    field_identifier: &str,
    chunk_id: i64,
    values: &[ScalarValue],
) -> String {
    let side = escape_identifier(&side_table_name(collection, field_identifier));
    let rows: Vec<String> = values
        .iter()
        .map(|value| format!("({chunk_id}, {})", render_scalar(value)))
        .collect();
    format!("INSERT INTO {side} (chunk_id, value) VALUES {}", rows.join(", "))
}

/// Deletes rows by internal id.
pub fn delete_rows(collection: &str, ids: &[i64]) -> String {
    let list: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!(
        "DELETE FROM {} WHERE id IN ({})",
        escape_identifier(collection),
        list.join(", ")
    )
}

/// Plain relational projection with a pre-assembled filter clause.
///
/// `filters` is either empty or the full join + `WHERE` fragment produced
/// by the filter compiler (or a caller-rendered containment predicate).
pub fn query_search(
    collection: &str,
    output_fields: &[String],
    filters: &str,
    limit: u32,
    offset: u32,
) -> String {
    let fields: Vec<String> = output_fields.iter().map(|f| escape_identifier(f)).collect();
    let mut statement = format!(
        "SELECT {} FROM {}",
        fields.join(", "),
        escape_identifier(collection)
    );
    if !filters.is_empty() {
        statement.push(' ');
        statement.push_str(filters);
    }
    statement.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
    statement
}

/// Nearest-neighbor query ordered best-match-first.
///
/// The metric's operator computes a distance (smaller is better), so the
/// ascending sort on the aliased column yields the best match first for
/// every supported metric.
pub fn vector_search(
    collection: &str,
    vector: &[f32],
    output_fields: &[String],
    metric: SimilarityMetric,
    filters: &str,
    limit: u32,
    offset: u32,
) -> String {
    let fields: Vec<String> = output_fields.iter().map(|f| escape_identifier(f)).collect();
    let mut statement = format!(
        "SELECT {}, vector {} {} AS distance FROM {}",
        fields.join(", "),
        metric.distance_operator(),
        vector_literal(vector),
        escape_identifier(collection)
    );
    if !filters.is_empty() {
        statement.push(' ');
        statement.push_str(filters);
    }
    statement.push_str(&format!(
        " ORDER BY distance ASC LIMIT {limit} OFFSET {offset}"
    ));
    statement
}
