//! # Statement Builder Tests
//!
//! Verifies the shapes of the rendered Postgres statements: collection DDL,
//! the side-table naming convention, mutation statements, and the
//! metric-to-operator mapping with its best-match-first ordering.

use anyvec::providers::db::postgres::sql;
use anyvec::types::{ScalarValue, SimilarityMetric};

/// The collection DDL carries the fixed native-field schema and the vector
/// column at the requested dimension.
#[test]
fn test_create_collection_ddl() {
    let ddl = sql::create_collection("docs", 768);

    assert_eq!(
        ddl,
        "CREATE TABLE \"docs\" (\
         id BIGSERIAL PRIMARY KEY, \
         owning_entity_id TEXT NOT NULL, \
         owning_long_id TEXT NOT NULL, \
         content TEXT, \
         vector vector(768), \
         server_id TEXT, \
         index_id TEXT)"
    );
}

#[test]
fn test_drop_collection_statement() {
    assert_eq!(sql::drop_collection("docs"), "DROP TABLE \"docs\"");
}

/// Collections are enumerated by the presence of a pgvector column.
#[test]
fn test_list_collections_targets_vector_columns() {
    assert!(sql::list_collections().contains("udt_name = 'vector'"));
}

/// The side-table naming convention is `collection + "__" + field`.
#[test]
fn test_side_table_name_convention() {
    assert_eq!(sql::side_table_name("docs", "topics"), "docs__topics");
}

#[test]
fn test_create_side_table_ddl() {
    let ddl = sql::create_side_table("docs", "topics", "TEXT");

    assert_eq!(
        ddl,
        "CREATE TABLE IF NOT EXISTS \"docs__topics\" (chunk_id BIGINT NOT NULL, value TEXT)"
    );
}

/// Scalar extra columns are added idempotently at index time.
#[test]
fn test_add_column_statement() {
    assert_eq!(
        sql::add_column("docs", "author", "TEXT"),
        "ALTER TABLE \"docs\" ADD COLUMN IF NOT EXISTS \"author\" TEXT"
    );
}

/// Inserts return the generated internal id for side-table wiring.
#[test]
fn test_insert_row_returns_id() {
    let statement = sql::insert_row(
        "docs",
        &["owning_entity_id".to_string(), "content".to_string()],
        &["'entity:1'".to_string(), "'hello'".to_string()],
    );

    assert_eq!(
        statement,
        "INSERT INTO \"docs\" (\"owning_entity_id\", \"content\") \
         VALUES ('entity:1', 'hello') RETURNING id"
    );
}

/// Multi-valued inserts write one side-table row per value, all keyed to
/// the parent chunk.
#[test]
fn test_insert_side_rows_one_row_per_value() {
    let statement = sql::insert_side_rows(
        "docs",
        "topics",
        7,
        &[ScalarValue::from("rust"), ScalarValue::from("go")],
    );

    assert_eq!(
        statement,
        "INSERT INTO \"docs__topics\" (chunk_id, value) VALUES (7, 'rust'), (7, 'go')"
    );
}

#[test]
fn test_delete_rows_by_internal_id() {
    assert_eq!(
        sql::delete_rows("docs", &[1, 2, 3]),
        "DELETE FROM \"docs\" WHERE id IN (1, 2, 3)"
    );
}

/// Query search renders projection, filter clause, and paging.
#[test]
fn test_query_search_statement() {
    let statement = sql::query_search(
        "docs",
        &["id".to_string(), "content".to_string()],
        "WHERE owning_entity_id IN ('entity:1')",
        10,
        5,
    );

    assert_eq!(
        statement,
        "SELECT \"id\", \"content\" FROM \"docs\" \
         WHERE owning_entity_id IN ('entity:1') LIMIT 10 OFFSET 5"
    );
}

/// An empty filter clause leaves no stray whitespace.
#[test]
fn test_query_search_without_filters() {
    let statement = sql::query_search("docs", &["id".to_string()], "", 10, 0);

    assert_eq!(statement, "SELECT \"id\" FROM \"docs\" LIMIT 10 OFFSET 0");
}

/// Each similarity metric maps to its distinct pgvector ordering operator.
#[test]
fn test_metric_operator_mapping() {
    assert_eq!(SimilarityMetric::Cosine.distance_operator(), "<=>");
    assert_eq!(SimilarityMetric::DotProduct.distance_operator(), "<#>");
    assert_eq!(SimilarityMetric::Euclidean.distance_operator(), "<->");
}

/// Vector search orders ascending on the aliased distance so results come
/// back best-match-first, and applies the same filter/paging semantics as
/// query search.
#[test]
fn test_vector_search_statement() {
    let statement = sql::vector_search(
        "docs",
        &[1.0, 0.0, 0.0],
        &["id".to_string(), "content".to_string()],
        SimilarityMetric::Cosine,
        "WHERE (\"status\" = ('published'))",
        10,
        0,
    );

    assert_eq!(
        statement,
        "SELECT \"id\", \"content\", vector <=> '[1,0,0]' AS distance FROM \"docs\" \
         WHERE (\"status\" = ('published')) \
         ORDER BY distance ASC LIMIT 10 OFFSET 0"
    );
}

#[test]
fn test_vector_search_euclidean_operator() {
    let statement = sql::vector_search(
        "docs",
        &[0.5, 0.5],
        &["id".to_string()],
        SimilarityMetric::Euclidean,
        "",
        3,
        0,
    );

    assert!(statement.contains("vector <-> '[0.5,0.5]' AS distance"));
    assert!(statement.ends_with("ORDER BY distance ASC LIMIT 3 OFFSET 0"));
}
