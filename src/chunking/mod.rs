//! Turning a decision's text into retrieval chunks
//!
//! The pipeline is: extract case metadata, split the text at section
//! headings, segment each section into sentences, then pack sentences into
//! overlapping chunks of bounded word count.

mod chunker;
mod metadata;
mod sections;
mod sentences;

pub use chunker::{build_rag_chunks, chunk_sentences, ChunkingConfig, RagChunk};
pub use metadata::{extract_case_metadata, CaseMetadata};
pub use sections::{identify_section, split_into_sections, Section, SectionKind, FULL_TEXT, PREAMBLE};
pub use sentences::split_sentences;
