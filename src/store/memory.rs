//! In-process [`ChunkStore`] with the same semantics as the PostgreSQL one

use super::{preview, require_case_no, ChunkHit, ChunkStore, PendingChunk, StoreError};
use crate::chunking::RagChunk;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct DecisionRow {
    id: i64,
    case_no: String,
    division: Option<String>,
    title: Option<String>,
}

/// A chunk as held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub id: i64,
    pub decision_id: i64,
    pub case_no: String,
    pub section: String,
    pub chunk_index: usize,
    pub text: String,
    pub token_count: Option<usize>,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Default)]
struct State {
    decisions: Vec<DecisionRow>,
    chunks: Vec<StoredChunk>,
    next_decision_id: i64,
    next_chunk_id: i64,
}

#[derive(Debug)]
pub struct MemoryStore {
    dimension: usize,
    state: Mutex<State>,
    fail_on: Option<String>,
}

impl MemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Mutex::new(State {
                next_decision_id: 1,
                next_chunk_id: 1,
                ..Default::default()
            }),
            fail_on: None,
        }
    }

    /// Makes `insert_chunk` fail for chunks whose text contains `needle`
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn chunks(&self) -> Vec<StoredChunk> {
        self.lock().chunks.clone()
    }

    pub fn decision_count(&self) -> usize {
        self.lock().decisions.len()
    }

    /// Stored `(division, title)` of a decision
    pub fn decision(&self, case_no: &str) -> Option<(Option<String>, Option<String>)> {
        self.lock()
            .decisions
            .iter()
            .find(|d| d.case_no == case_no)
            .map(|d| (d.division.clone(), d.title.clone()))
    }

    fn check_dimension(&self, v: &[f32]) -> Result<(), StoreError> {
        if v.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(StoreError::NonFiniteVector);
        }
        Ok(())
    }

    fn upsert_decision_locked(state: &mut State, case_no: &str, chunk: &RagChunk) -> i64 {
        if let Some(existing) = state.decisions.iter_mut().find(|d| d.case_no == case_no) {
            if chunk.division.is_some() {
                existing.division = chunk.division.clone();
            }
            if chunk.title.is_some() {
                existing.title = chunk.title.clone();
            }
            return existing.id;
        }

        let id = state.next_decision_id;
        state.next_decision_id += 1;
        state.decisions.push(DecisionRow {
            id,
            case_no: case_no.to_string(),
            division: chunk.division.clone(),
            title: chunk.title.clone(),
        });
        id
    }
}

/// pgvector's `<=>`: one minus cosine similarity
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl ChunkStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn initialize_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_decision(&self, chunk: &RagChunk) -> Result<i64, StoreError> {
        let case_no = require_case_no(chunk)?;
        Ok(Self::upsert_decision_locked(&mut self.lock(), case_no, chunk))
    }

    async fn insert_chunk(&self, chunk: &RagChunk) -> Result<Option<i64>, StoreError> {
        let case_no = require_case_no(chunk)?;
        if let Some(needle) = &self.fail_on {
            if chunk.text.contains(needle.as_str()) {
                return Err(StoreError::Other(format!(
                    "Injected failure for chunk containing {:?}",
                    needle
                )));
            }
        }

        let mut state = self.lock();
        let decision_id = Self::upsert_decision_locked(&mut state, case_no, chunk);

        let duplicate = state.chunks.iter().any(|c| {
            c.case_no == case_no && c.section == chunk.section && c.chunk_index == chunk.chunk_index
        });
        if duplicate {
            return Ok(None);
        }

        let id = state.next_chunk_id;
        state.next_chunk_id += 1;
        state.chunks.push(StoredChunk {
            id,
            decision_id,
            case_no: case_no.to_string(),
            section: chunk.section.clone(),
            chunk_index: chunk.chunk_index,
            text: chunk.text.clone(),
            token_count: None,
            embedding: None,
        });
        Ok(Some(id))
    }

    async fn pending_chunks(&self) -> Result<Vec<PendingChunk>, StoreError> {
        let state = self.lock();
        let mut pending: Vec<PendingChunk> = state
            .chunks
            .iter()
            .filter(|c| c.embedding.is_none())
            .map(|c| PendingChunk {
                id: c.id,
                text: c.text.clone(),
            })
            .collect();
        pending.sort_by_key(|c| c.id);
        Ok(pending)
    }

    async fn set_embedding(
        &self,
        id: i64,
        embedding: &[f32],
        token_count: usize,
    ) -> Result<(), StoreError> {
        self.check_dimension(embedding)?;
        let mut state = self.lock();
        let chunk = state
            .chunks
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::ChunkNotFound(id))?;
        chunk.embedding = Some(embedding.to_vec());
        chunk.token_count = Some(token_count);
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ChunkHit>, StoreError> {
        self.check_dimension(query)?;
        let state = self.lock();

        let mut hits: Vec<ChunkHit> = state
            .chunks
            .iter()
            .filter_map(|c| {
                let embedding = c.embedding.as_ref()?;
                Some(ChunkHit {
                    id: c.id,
                    case_no: c.case_no.clone(),
                    section: Some(c.section.clone()),
                    chunk_index: i32::try_from(c.chunk_index).unwrap_or(i32::MAX),
                    preview: preview(&c.text),
                    distance: cosine_distance(query, embedding),
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }
}
