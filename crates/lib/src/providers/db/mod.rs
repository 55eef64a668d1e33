pub mod postgres;
pub mod vector_store;

pub use vector_store::VectorStore;
