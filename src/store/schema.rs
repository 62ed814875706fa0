//! PostgreSQL + pgvector schema
//!
//! Every statement is idempotent so `init-db` can run against an existing
//! database.

pub const CREATE_EXTENSION: &str = "CREATE EXTENSION IF NOT EXISTS vector;";

pub const CREATE_DECISIONS: &str = r#"
CREATE TABLE IF NOT EXISTS decisions (
    id          BIGSERIAL PRIMARY KEY,
    case_no     TEXT NOT NULL UNIQUE,
    division    TEXT,
    title       TEXT,
    created_at  TIMESTAMPTZ DEFAULT NOW(),
    updated_at  TIMESTAMPTZ DEFAULT NOW()
);
"#;

pub const CREATE_DECISION_CHUNKS: &str = r#"
CREATE TABLE IF NOT EXISTS decision_chunks (
    id              BIGSERIAL PRIMARY KEY,
    decision_id     BIGINT NOT NULL REFERENCES decisions(id) ON DELETE CASCADE,
    case_no         TEXT NOT NULL,
    section         TEXT,
    chunk_index     INT NOT NULL,
    text            TEXT NOT NULL,
    token_count     INT,
    embedding       VECTOR(1024),
    created_at      TIMESTAMPTZ DEFAULT NOW(),
    updated_at      TIMESTAMPTZ DEFAULT NOW()
);
"#;

pub const CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_decision_chunks_embedding
    ON decision_chunks
    USING ivfflat (embedding vector_cosine_ops)
    WITH (lists = 100);

CREATE INDEX IF NOT EXISTS idx_decision_chunks_decision_idx
    ON decision_chunks (decision_id, chunk_index);

CREATE INDEX IF NOT EXISTS idx_decision_chunks_case_no
    ON decision_chunks (case_no);

CREATE INDEX IF NOT EXISTS idx_decisions_case_no
    ON decisions (case_no);
"#;

pub const CREATE_UPDATED_AT_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
"#;

pub const CREATE_UPDATED_AT_TRIGGERS: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_trigger WHERE tgname = 'trg_decisions_set_updated_at'
    ) THEN
        CREATE TRIGGER trg_decisions_set_updated_at
        BEFORE UPDATE ON decisions
        FOR EACH ROW
        EXECUTE FUNCTION set_updated_at();
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_trigger WHERE tgname = 'trg_decision_chunks_set_updated_at'
    ) THEN
        CREATE TRIGGER trg_decision_chunks_set_updated_at
        BEFORE UPDATE ON decision_chunks
        FOR EACH ROW
        EXECUTE FUNCTION set_updated_at();
    END IF;
END $$;
"#;

pub const ADD_CHUNK_UNIQUE_CONSTRAINT: &str = r#"
DO $$
BEGIN
    ALTER TABLE decision_chunks
    ADD CONSTRAINT unique_decision_chunk
    UNIQUE (case_no, section, chunk_index);
EXCEPTION WHEN duplicate_object THEN
    NULL;
END $$;
"#;

/// Schema steps in execution order, with a label for logging
pub const SCHEMA_STEPS: &[(&str, &str)] = &[
    ("vector extension", CREATE_EXTENSION),
    ("decisions table", CREATE_DECISIONS),
    ("decision_chunks table", CREATE_DECISION_CHUNKS),
    ("indexes", CREATE_INDEXES),
    ("updated_at function", CREATE_UPDATED_AT_FUNCTION),
    ("updated_at triggers", CREATE_UPDATED_AT_TRIGGERS),
    ("chunk unique constraint", ADD_CHUNK_UNIQUE_CONSTRAINT),
];

pub const UPSERT_DECISION: &str = r#"
INSERT INTO decisions (case_no, division, title)
VALUES ($1, $2, $3)
ON CONFLICT (case_no) DO UPDATE
    SET division = COALESCE(EXCLUDED.division, decisions.division),
        title    = COALESCE(EXCLUDED.title, decisions.title)
RETURNING id
"#;

pub const INSERT_CHUNK: &str = r#"
INSERT INTO decision_chunks (decision_id, case_no, section, chunk_index, text)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (case_no, section, chunk_index) DO NOTHING
RETURNING id
"#;

pub const SELECT_PENDING: &str =
    "SELECT id, text FROM decision_chunks WHERE embedding IS NULL ORDER BY id";

/// The vector travels as its text form (`[0.1,0.2,...]`) and is cast server-side
pub const SET_EMBEDDING: &str = r#"
UPDATE decision_chunks
SET embedding = $1::text::vector,
    token_count = $2
WHERE id = $3
"#;

pub const SEARCH: &str = r#"
SELECT
    id,
    case_no,
    section,
    chunk_index,
    substring(text for 300) AS preview,
    (embedding <=> $1::text::vector)::float8 AS distance
FROM decision_chunks
WHERE embedding IS NOT NULL
ORDER BY embedding <=> $1::text::vector ASC
LIMIT $2
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_steps_are_idempotent() {
        for (label, sql) in SCHEMA_STEPS {
            let upper = sql.to_uppercase();
            assert!(
                upper.contains("IF NOT EXISTS")
                    || upper.contains("OR REPLACE")
                    || upper.contains("DUPLICATE_OBJECT"),
                "{} is not idempotent",
                label
            );
        }
    }

    #[test]
    fn test_extension_created_first() {
        assert_eq!(SCHEMA_STEPS[0].1, CREATE_EXTENSION);
    }
}
