//! # Core Data Model
//!
//! Shared types for the vector collection and query engine: the reserved
//! native-field set, similarity metrics, tagged field values, the condition
//! tree consumed by the filter compiler, and the schema metadata contract
//! that describes indexed fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved column names present on every collection.
///
/// `id` is generated by the database; the rest are populated on insert.
/// Extra fields may never reuse one of these names.
pub const NATIVE_FIELDS: [&str; 7] = [
    "id",
    "owning_entity_id",
    "owning_long_id",
    "content",
    "vector",
    "server_id",
    "index_id",
];

/// Returns `true` if `name` is one of the reserved native field names.
pub fn is_native_field(name: &str) -> bool {
    NATIVE_FIELDS.contains(&name)
}

/// A JSON object representing one result row.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// The vector distance function used to rank nearest neighbors.
///
/// The metric is fixed per index configuration and read once per query,
/// never negotiated per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    DotProduct,
    Euclidean,
}

impl SimilarityMetric {
    /// The pgvector ordering operator for this metric.
    ///
    /// Each operator yields a distance where smaller is better, so results
    /// ordered ascending come back best-match-first. `<#>` returns the
    /// negated inner product for exactly that reason.
    pub fn distance_operator(&self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "<=>",
            SimilarityMetric::DotProduct => "<#>",
            SimilarityMetric::Euclidean => "<->",
        }
    }
}

/// A single typed value, as stored in a scalar column or one side-table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl ScalarValue {
    /// Whether the value is free text and therefore must be escaped with
    /// connection-grade string escaping before entering a statement.
    pub fn is_text(&self) -> bool {
        matches!(self, ScalarValue::String(_))
    }

    /// The raw text content, without any SQL quoting.
    pub fn to_text(&self) -> String {
        match self {
            ScalarValue::String(s) => s.clone(),
            ScalarValue::Integer(i) => i.to_string(),
            ScalarValue::Float(f) => f.to_string(),
            ScalarValue::Bool(b) => b.to_string(),
        }
    }

    /// The Postgres column type used when this value creates a column or
    /// side table on demand.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ScalarValue::String(_) => "TEXT",
            ScalarValue::Integer(_) => "BIGINT",
            ScalarValue::Float(_) => "DOUBLE PRECISION",
            ScalarValue::Bool(_) => "BOOLEAN",
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

/// A caller-defined extra-field value, tagged by cardinality.
///
/// Scalar values become columns on the main table; multi-valued entries are
/// written to the field's side table, one row per value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(ScalarValue),
    Multi(Vec<ScalarValue>),
}

impl FieldValue {
    pub fn is_multiple(&self) -> bool {
        matches!(self, FieldValue::Multi(_))
    }
}

/// One embedding chunk ready for insertion into a collection.
///
/// Owned by exactly one source entity (`owning_entity_id`); a source entity
/// may produce many records, one per chunk, disambiguated by
/// `owning_long_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub owning_entity_id: String,
    pub owning_long_id: String,
    pub content: String,
    pub vector: Vec<f32>,
    pub server_id: String,
    pub index_id: String,
    /// Extra fields keyed by column name. Keys must not collide with the
    /// reserved native field names.
    pub extra_fields: HashMap<String, FieldValue>,
}

/// Declared type of an indexed field, from the index schema metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    FullText,
    Integer,
    Decimal,
    Boolean,
    Date,
}

impl FieldType {
    /// Textual values take the connection-aware string escaping path; all
    /// other types are machine-typed and rendered directly.
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::String | FieldType::FullText)
    }
}

/// Metadata for one indexed field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// The physical column identifier (also names the side table suffix).
    pub identifier: String,
    pub field_type: FieldType,
    pub is_multiple: bool,
}

/// Field metadata lookup for one search index.
///
/// The filter compiler and the indexing orchestrator resolve declared field
/// types and cardinality through this contract; the host system backs it
/// with whatever index configuration it keeps.
pub trait IndexSchema: Send + Sync {
    /// Identifier of the index, used in warnings and stamped onto records.
    fn index_id(&self) -> &str;

    /// Identifier of the server the index belongs to.
    fn server_id(&self) -> &str;

    /// Declared metadata for an indexed field, or `None` when the field is
    /// unknown to the index.
    fn field(&self, name: &str) -> Option<FieldInfo>;
}

/// A map-backed [`IndexSchema`], for hosts with static configuration and
/// for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIndexSchema {
    index_id: String,
    server_id: String,
    fields: HashMap<String, FieldInfo>,
}

impl StaticIndexSchema {
    pub fn new(server_id: impl Into<String>, index_id: impl Into<String>) -> Self {
        Self {
            index_id: index_id.into(),
            server_id: server_id.into(),
            fields: HashMap::new(),
        }
    }

    /// Declares a field, using its name as the physical identifier.
    pub fn with_field(mut self, name: &str, field_type: FieldType, is_multiple: bool) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldInfo {
                identifier: name.to_string(),
                field_type,
                is_multiple,
            },
        );
        self
    }
}

impl IndexSchema for StaticIndexSchema {
    fn index_id(&self) -> &str {
        &self.index_id
    }

    fn server_id(&self) -> &str {
        &self.server_id
    }

    fn field(&self, name: &str) -> Option<FieldInfo> {
        self.fields.get(name).cloned()
    }
}

/// Combinator joining the members of a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// The value side of a condition leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Single(ScalarValue),
    Many(Vec<ScalarValue>),
}

impl ConditionValue {
    /// Normalizes to a value list, the form every rendering path consumes.
    pub fn to_vec(&self) -> Vec<ScalarValue> {
        match self {
            ConditionValue::Single(v) => vec![v.clone()],
            ConditionValue::Many(vs) => vs.clone(),
        }
    }
}

/// A leaf of the condition tree: one field, operator, and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: ConditionValue,
}

/// A node of the condition tree: either a nested group or a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Condition(Condition),
}

/// A finite, acyclic boolean query tree of AND/OR groups over leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub conjunction: Conjunction,
    pub nodes: Vec<ConditionNode>,
}

impl ConditionGroup {
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            nodes: Vec::new(),
        }
    }

    /// Adds a leaf condition.
    pub fn condition(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: ConditionValue,
    ) -> Self {
        self.nodes.push(ConditionNode::Condition(Condition {
            field: field.into(),
            operator: operator.into(),
            value,
        }));
        self
    }

    /// Adds a nested group.
    pub fn group(mut self, group: ConditionGroup) -> Self {
        self.nodes.push(ConditionNode::Group(group));
        self
    }
}

/// One source document queued for indexing.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    /// The owning entity id in the host system.
    pub id: String,
    /// Field values keyed by field identifier, as supplied to the embedding
    /// strategy.
    pub fields: HashMap<String, FieldValue>,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }
}

/// One embedding chunk returned by an embedding producer.
///
/// The orchestrator rejects chunks that do not satisfy the shape contract:
/// a non-empty `id`, non-empty `values`, and a metadata map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    /// Chunk identifier, unique within the owning document.
    pub id: String,
    /// The embedding vector.
    pub values: Vec<f32>,
    /// Per-chunk metadata, split into native and extra fields on insert.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Which database and collection one search index writes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Target database; `None` uses the resolved default database.
    #[serde(default)]
    pub database_name: Option<String>,
    pub collection: String,
    /// Similarity metric for every vector search against this index.
    #[serde(default)]
    pub metric: SimilarityMetric,
}
