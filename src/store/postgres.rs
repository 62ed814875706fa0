//! PostgreSQL + pgvector implementation of [`ChunkStore`]

use super::schema;
use super::{require_case_no, ChunkHit, ChunkStore, PendingChunk, StoreError};
use crate::chunking::RagChunk;
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

/// pgvector text representation: `[0.1,-0.2,...]`
pub fn vector_literal(v: &[f32]) -> Result<String, StoreError> {
    if v.iter().any(|x| !x.is_finite()) {
        return Err(StoreError::NonFiniteVector);
    }
    let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
    Ok(format!("[{}]", parts.join(",")))
}

fn to_i32(value: usize, what: &str) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Other(format!("{} {} out of range", what, value)))
}

pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connects and drives the connection on a background task
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let (client, connection) = config.to_pg_config().connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        info!("Connected to {}", config);
        Ok(Self { client })
    }
}

#[async_trait]
impl ChunkStore for PgStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn initialize_schema(&self) -> Result<(), StoreError> {
        for (label, sql) in schema::SCHEMA_STEPS {
            debug!("Ensuring {}", label);
            self.client.batch_execute(sql).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    async fn upsert_decision(&self, chunk: &RagChunk) -> Result<i64, StoreError> {
        let case_no = require_case_no(chunk)?;
        let row = self
            .client
            .query_one(
                schema::UPSERT_DECISION,
                &[&case_no, &chunk.division.as_deref(), &chunk.title.as_deref()],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn insert_chunk(&self, chunk: &RagChunk) -> Result<Option<i64>, StoreError> {
        let case_no = require_case_no(chunk)?;
        let chunk_index = to_i32(chunk.chunk_index, "chunk_index")?;
        let decision_id = self.upsert_decision(chunk).await?;

        let row = self
            .client
            .query_opt(
                schema::INSERT_CHUNK,
                &[&decision_id, &case_no, &chunk.section, &chunk_index, &chunk.text],
            )
            .await?;

        let id = row.map(|r| r.get::<_, i64>(0));
        match id {
            Some(id) => debug!(id, case_no, section = %chunk.section, chunk_index, "Inserted chunk"),
            None => debug!(case_no, section = %chunk.section, chunk_index, "Chunk already stored"),
        }
        Ok(id)
    }

    async fn pending_chunks(&self) -> Result<Vec<PendingChunk>, StoreError> {
        let rows = self.client.query(schema::SELECT_PENDING, &[]).await?;
        Ok(rows
            .into_iter()
            .map(|row| PendingChunk {
                id: row.get(0),
                text: row.get(1),
            })
            .collect())
    }

    async fn set_embedding(
        &self,
        id: i64,
        embedding: &[f32],
        token_count: usize,
    ) -> Result<(), StoreError> {
        let literal = vector_literal(embedding)?;
        let token_count = to_i32(token_count, "token_count")?;
        let updated = self
            .client
            .execute(schema::SET_EMBEDDING, &[&literal, &token_count, &id])
            .await?;
        if updated == 0 {
            return Err(StoreError::ChunkNotFound(id));
        }
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ChunkHit>, StoreError> {
        let literal = vector_literal(query)?;
        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let rows = self.client.query(schema::SEARCH, &[&literal, &limit]).await?;

        Ok(rows
            .into_iter()
            .map(|row| ChunkHit {
                id: row.get("id"),
                case_no: row.get("case_no"),
                section: row.get("section"),
                chunk_index: row.get("chunk_index"),
                preview: row.get("preview"),
                distance: row.get("distance"),
            })
            .collect())
    }
}
