//! Sentence-aligned chunk packing with overlap

use super::metadata::extract_case_metadata;
use super::sections::split_into_sections;
use super::sentences::split_sentences;
use serde::{Deserialize, Serialize};

/// Parameters for splitting a decision into retrieval chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Upper bound on words per chunk, exceeded only by a single oversized sentence plus overlap
    pub max_tokens: usize,
    /// Sentences repeated from the end of one chunk at the start of the next
    pub overlap_sentences: usize,
    /// Chunks shorter than this are folded into the previous chunk
    pub min_chunk_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 350,
            overlap_sentences: 2,
            min_chunk_words: 15,
        }
    }
}

/// A chunk ready to be stored, carrying its decision's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagChunk {
    pub case_no: Option<String>,
    pub division: Option<String>,
    pub title: Option<String>,
    pub section: String,
    /// Position within the section, starting at 0
    pub chunk_index: usize,
    pub text: String,
}

fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

/// Packs the sentences of `text` into chunks of at most `max_tokens` words.
pub fn chunk_sentences(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for (i, sentence) in sentences.iter().enumerate() {
        let sentence_len = word_count(sentence);

        if current_len + sentence_len <= config.max_tokens {
            current.push(sentence);
            current_len += sentence_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        let overlap_start = i.saturating_sub(config.overlap_sentences);
        current = sentences[overlap_start..i]
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(sentence.as_str()))
            .collect();
        current_len = current.iter().map(|s| word_count(s)).sum();
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    let mut cleaned: Vec<String> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match cleaned.last_mut() {
            Some(previous) if word_count(&chunk) < config.min_chunk_words => {
                previous.push(' ');
                previous.push_str(&chunk);
            }
            _ => cleaned.push(chunk),
        }
    }

    cleaned
}

/// Metadata, sections, then per-section chunks, in document order
pub fn build_rag_chunks(full_text: &str, config: &ChunkingConfig) -> Vec<RagChunk> {
    let meta = extract_case_metadata(full_text);

    split_into_sections(full_text)
        .into_iter()
        .flat_map(|section| {
            let meta = meta.clone();
            chunk_sentences(&section.text, config)
                .into_iter()
                .enumerate()
                .map(move |(chunk_index, text)| RagChunk {
                    case_no: meta.case_no.clone(),
                    division: meta.division.clone(),
                    title: meta.title.clone(),
                    section: section.name.clone(),
                    chunk_index,
                    text,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(words: usize, tag: &str) -> String {
        let mut s = vec![tag.to_string()];
        s.extend((1..words).map(|i| format!("w{}", i)));
        format!("{}.", s.join(" "))
    }

    fn small_config(max_tokens: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            max_tokens,
            overlap_sentences: overlap,
            min_chunk_words: 0,
        }
    }

    #[test]
    fn test_everything_fits_in_one_chunk() {
        let text = format!("{} {}", sentence(5, "Alpha"), sentence(5, "Beta"));
        let chunks = chunk_sentences(&text, &small_config(20, 2));
        assert_eq!(chunks, vec![text]);
    }

    #[test]
    fn test_overlap_repeats_previous_sentences() {
        let s: Vec<String> = ["Alpha", "Beta", "Gamma", "Delta"]
            .iter()
            .map(|t| sentence(4, t))
            .collect();
        let text = s.join(" ");

        let chunks = chunk_sentences(&text, &small_config(8, 1));

        assert_eq!(
            chunks,
            vec![
                format!("{} {}", s[0], s[1]),
                format!("{} {}", s[1], s[2]),
                format!("{} {}", s[2], s[3]),
            ]
        );
    }

    #[test]
    fn test_oversized_sentence_stands_alone() {
        let s = [sentence(3, "Alpha"), sentence(12, "Beta"), sentence(3, "Gamma")];
        let text = s.join(" ");

        let chunks = chunk_sentences(&text, &small_config(5, 0));

        assert_eq!(chunks, vec![s[0].clone(), s[1].clone(), s[2].clone()]);
    }

    #[test]
    fn test_tiny_chunks_merge_into_previous() {
        let s = [sentence(20, "Alpha"), sentence(3, "Beta")];
        let text = s.join(" ");
        let config = ChunkingConfig {
            max_tokens: 20,
            overlap_sentences: 0,
            min_chunk_words: 15,
        };

        let chunks = chunk_sentences(&text, &config);
        assert_eq!(chunks, vec![format!("{} {}", s[0], s[1])]);
    }

    #[test]
    fn test_first_tiny_chunk_is_kept() {
        let chunks = chunk_sentences("Short one.", &ChunkingConfig::default());
        assert_eq!(chunks, vec!["Short one."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_sentences("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_build_rag_chunks_indexes_per_section() {
        let text = "SECOND DIVISION\nG.R. No. 200\nPEOPLE v. SANTOS\n\
                    FACTS\nThe accused was charged. He pleaded not guilty.\n\
                    RULING\nThe appeal is dismissed.";
        let chunks = build_rag_chunks(text, &ChunkingConfig::default());

        let sections: Vec<(&str, usize)> = chunks
            .iter()
            .map(|c| (c.section.as_str(), c.chunk_index))
            .collect();
        assert_eq!(sections, vec![("PREAMBLE", 0), ("FACTS", 0), ("RULING", 0)]);

        for chunk in &chunks {
            assert_eq!(chunk.case_no.as_deref(), Some("G.R. No. 200"));
            assert_eq!(chunk.division.as_deref(), Some("SECOND DIVISION"));
            assert_eq!(chunk.title.as_deref(), Some("SECOND DIVISION"));
        }
        assert!(chunks[1].text.starts_with("FACTS:"));
    }
}
