//! Loading cleaned decisions into the chunk store
//!
//! Ingestion runs in two resumable passes:
//!
//! 1. [`chunk_and_upsert`] reads the cleaned JSONL, chunks each decision and
//!    inserts the chunks. The URL of the last fully inserted decision is kept
//!    in a [`Checkpoint`], and a rerun skips everything up to it.
//! 2. [`embed_pending`] embeds every stored chunk that has no vector yet.

mod checkpoint;

pub use checkpoint::Checkpoint;

use crate::chunking::{build_rag_chunks, ChunkingConfig};
use crate::embedding::Embedder;
use crate::scraper::DecisionRecord;
use crate::store::{ChunkStore, StoreError};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counters for a [`chunk_and_upsert`] run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRunStats {
    /// Records chunked and inserted without error
    pub records: usize,
    /// Records passed over while seeking the checkpoint
    pub skipped: usize,
    pub malformed: usize,
    pub chunks_inserted: usize,
    /// Chunks already present in the store
    pub duplicates: usize,
    /// Records abandoned after an insert failure
    pub failed_records: usize,
}

/// Counters for an [`embed_pending`] run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmbedRunStats {
    pub pending: usize,
    pub embedded: usize,
    pub failed: usize,
}

/// Chunks every decision in `input` and inserts the chunks into `store`.
///
/// Malformed lines, including records without `title`, `url` or `text`,
/// are logged and skipped. Within a record, the first failed insert
/// abandons the rest of that record and leaves the checkpoint where it was.
pub async fn chunk_and_upsert(
    store: &dyn ChunkStore,
    input: &Path,
    checkpoint: &Checkpoint,
    config: &ChunkingConfig,
) -> Result<ChunkRunStats, IngestError> {
    let start = Instant::now();
    let last_url = checkpoint.load();
    let mut seeking = last_url.is_some();
    info!(resume = seeking, last_url = ?last_url, "Starting chunk ingestion from {}", input.display());

    let reader = BufReader::new(File::open(input)?);
    let mut stats = ChunkRunStats::default();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: DecisionRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping malformed record");
                stats.malformed += 1;
                continue;
            }
        };

        if seeking {
            stats.skipped += 1;
            if Some(&record.url) == last_url.as_ref() {
                seeking = false;
            }
            continue;
        }

        debug!(line = line_number, url = %record.url, "Processing record");
        let chunks = build_rag_chunks(&record.text, config);

        let mut complete = true;
        for chunk in &chunks {
            match store.insert_chunk(chunk).await {
                Ok(Some(id)) => {
                    debug!(id, "Inserted chunk");
                    stats.chunks_inserted += 1;
                }
                Ok(None) => stats.duplicates += 1,
                Err(e) => {
                    warn!(url = %record.url, section = %chunk.section, chunk_index = chunk.chunk_index, error = %e, "Failed to insert chunk");
                    complete = false;
                    break;
                }
            }
        }

        if complete {
            checkpoint.save(&record.url)?;
            stats.records += 1;
        } else {
            stats.failed_records += 1;
        }
    }

    if seeking {
        warn!(
            last_url = ?last_url,
            "Checkpointed URL not found in input; nothing was ingested. Remove {} to start over",
            checkpoint.path().display()
        );
    }

    info!(
        records = stats.records,
        chunks = stats.chunks_inserted,
        duplicates = stats.duplicates,
        skipped = stats.skipped,
        malformed = stats.malformed,
        failed = stats.failed_records,
        elapsed_secs = start.elapsed().as_secs(),
        "Chunking complete"
    );
    Ok(stats)
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("embedding [{bar:40}] {pos}/{len} {eta}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Embeds and stores a vector for every chunk that has none.
///
/// A chunk that fails to embed or update is logged, counted and left
/// pending for the next run.
pub async fn embed_pending(
    store: &dyn ChunkStore,
    embedder: Arc<dyn Embedder>,
) -> Result<EmbedRunStats, IngestError> {
    let start = Instant::now();
    let pending = store.pending_chunks().await?;
    let mut stats = EmbedRunStats {
        pending: pending.len(),
        ..Default::default()
    };
    info!("Found {} chunks to embed with {}", pending.len(), embedder.name());

    let bar = progress_bar(pending.len());
    for chunk in pending {
        bar.inc(1);
        let id = chunk.id;
        let model = Arc::clone(&embedder);

        let encoded = tokio::task::spawn_blocking(move || {
            let vector = model.encode_passage(&chunk.text)?;
            let tokens = model.count_tokens(&chunk.text)?;
            Ok::<_, crate::embedding::EmbeddingError>((vector, tokens))
        })
        .await;

        let (vector, tokens) = match encoded {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(id, error = %e, "Failed to embed chunk");
                stats.failed += 1;
                continue;
            }
            Err(e) => {
                warn!(id, error = %e, "Embedding task panicked");
                stats.failed += 1;
                continue;
            }
        };

        match store.set_embedding(id, &vector, tokens).await {
            Ok(()) => {
                debug!(id, tokens, "Embedded chunk");
                stats.embedded += 1;
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to store embedding");
                stats.failed += 1;
            }
        }
    }
    bar.finish_and_clear();

    info!(
        embedded = stats.embedded,
        failed = stats.failed,
        elapsed_secs = start.elapsed().as_secs(),
        "Embedding complete"
    );
    Ok(stats)
}
