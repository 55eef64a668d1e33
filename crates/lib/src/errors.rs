use thiserror::Error;

/// Fatal error types for the vector database core.
///
/// Structural and configuration errors always propagate to the caller.
/// Failures that the provider absorbs on purpose (speculative deletes,
/// lifecycle statements racing an existing collection) are represented as
/// [`VdbWarning`] instead, so callers can tell the two categories apart
/// without inspecting log output.
#[derive(Error, Debug)]
pub enum VdbError {
    #[error("Postgres {0} is not configured")]
    NotConfigured(&'static str),
    #[error("Failed to connect to Postgres: {0}")]
    Connection(String),
    #[error("Failed to create collection `{collection}`: {message}")]
    CreateCollection { collection: String, message: String },
    #[error("Failed to drop collection `{collection}`: {message}")]
    DropCollection { collection: String, message: String },
    #[error("Failed to list collections: {0}")]
    GetCollections(String),
    #[error("Failed to add field `{field}` to collection `{collection}`: {message}")]
    AddFieldIfNotExists {
        collection: String,
        field: String,
        message: String,
    },
    #[error("Extra field `{0}` collides with a reserved native field name")]
    ReservedFieldName(String),
    #[error("Failed to insert into collection `{collection}`: {message}")]
    InsertIntoCollection { collection: String, message: String },
    #[error("Failed to delete from collection `{collection}`: {message}")]
    DeleteFromCollection { collection: String, message: String },
    #[error("Query search against `{collection}` failed: {message}")]
    QuerySearch { collection: String, message: String },
    #[error("Vector search against `{collection}` failed: {message}")]
    VectorSearch { collection: String, message: String },
    #[error("Embedding chunk is malformed: {0}")]
    MalformedEmbedding(String),
}

/// Recoverable conditions that are logged and absorbed instead of failing
/// the whole operation.
///
/// These cover the lenient paths of the provider: idempotent lifecycle
/// statements, speculative deletes, and filter leaves that cannot be
/// compiled. An operation that ends in one of these still returns `Ok`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VdbWarning {
    #[error("Create collection error: {0}")]
    CreateCollection(String),
    #[error("Drop collection error: {0}")]
    DropCollection(String),
    #[error("Delete from collection error: {0}")]
    DeleteFromCollection(String),
    #[error("Field `{field}` is not indexed on `{index}` so cannot be filtered on")]
    UnknownField { field: String, index: String },
    #[error("Operator `{operator}` is not supported on multi-valued fields")]
    UnsupportedOperator { operator: String },
}

/// How an idempotent lifecycle or delete operation concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The statement ran to completion.
    Applied,
    /// The statement failed in a way treated as benign; the warning has
    /// been logged and the operation reported as successful.
    Skipped(VdbWarning),
}

impl Outcome {
    /// Returns `true` when the underlying statement actually ran.
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }
}
