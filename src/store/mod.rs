//! Chunk storage and vector search
//!
//! [`ChunkStore`] covers everything the pipeline and the API need from the
//! database. [`PgStore`] talks to PostgreSQL with pgvector; [`MemoryStore`]
//! keeps the same semantics in process for tests and local experiments.

mod memory;
mod postgres;
pub mod schema;

pub use memory::{MemoryStore, StoredChunk};
pub use postgres::{vector_literal, PgStore};

use crate::chunking::RagChunk;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Characters of chunk text returned with each hit
pub const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Chunk {section}#{chunk_index} has no case number")]
    MissingCaseNumber { section: String, chunk_index: usize },

    #[error("Vector has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector contains a non-finite value")]
    NonFiniteVector,

    #[error("Chunk {0} not found")]
    ChunkNotFound(i64),

    #[error("{0}")]
    Other(String),
}

/// A stored chunk still waiting for its embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChunk {
    pub id: i64,
    pub text: String,
}

/// One nearest-neighbour result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkHit {
    pub id: i64,
    pub case_no: String,
    pub section: Option<String>,
    pub chunk_index: i32,
    pub preview: String,
    /// Cosine distance to the query, in `[0, 2]`
    pub distance: f64,
}

#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Creates tables, indexes and triggers if missing
    async fn initialize_schema(&self) -> Result<(), StoreError>;

    /// Inserts or updates the chunk's decision and returns its id.
    /// A `None` division or title never overwrites a stored value.
    async fn upsert_decision(&self, chunk: &RagChunk) -> Result<i64, StoreError>;

    /// Upserts the decision, then inserts the chunk. Returns `None` when a
    /// chunk with the same `(case_no, section, chunk_index)` already exists.
    async fn insert_chunk(&self, chunk: &RagChunk) -> Result<Option<i64>, StoreError>;

    /// Chunks without an embedding, by ascending id
    async fn pending_chunks(&self) -> Result<Vec<PendingChunk>, StoreError>;

    async fn set_embedding(
        &self,
        id: i64,
        embedding: &[f32],
        token_count: usize,
    ) -> Result<(), StoreError>;

    /// Up to `k` embedded chunks nearest to `query`, closest first
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ChunkHit>, StoreError>;
}

/// Case number of `chunk`, or the error an insert would fail with
pub(crate) fn require_case_no(chunk: &RagChunk) -> Result<&str, StoreError> {
    chunk
        .case_no
        .as_deref()
        .ok_or_else(|| StoreError::MissingCaseNumber {
            section: chunk.section.clone(),
            chunk_index: chunk.chunk_index,
        })
}

pub(crate) fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
