//! Rendering of search results for the terminal

use crate::search::SearchHit;
use anyhow::{Context, Result};
use serde_json::json;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `{"results": [...]}`, the same shape the HTTP API returns
    Json,
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_hits(&self, query: &str, hits: &[SearchHit]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&json!({ "results": hits }))
                .context("Failed to serialize search results"),
            OutputFormat::Human => Ok(Self::format_human(query, hits)),
        }
    }

    fn format_human(query: &str, hits: &[SearchHit]) -> String {
        let mut out = String::new();
        if hits.is_empty() {
            let _ = writeln!(out, "No results for \"{}\".", query);
            return out;
        }

        let _ = writeln!(out, "Results for \"{}\":", query);
        for (rank, hit) in hits.iter().enumerate() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}. {} | {} #{}  (similarity {:.3}, distance {:.3})",
                rank + 1,
                hit.case_no,
                hit.section.as_deref().unwrap_or("-"),
                hit.chunk_index,
                hit.similarity,
                hit.distance
            );
            for line in hit.preview.lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "   {}", line.trim());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hit() -> SearchHit {
        SearchHit {
            id: 7,
            case_no: "G.R. No. 161796".to_string(),
            section: Some("RULING".to_string()),
            chunk_index: 2,
            preview: "The petition is DENIED.\n\nSO ORDERED.".to_string(),
            distance: 0.5,
            similarity: 0.75,
        }
    }

    #[test]
    fn test_human_output() {
        let out = OutputFormatter::new(OutputFormat::Human).format_hits("ruling", &[hit()]).unwrap();
        assert_eq!(
            out,
            "Results for \"ruling\":\n\n\
             1. G.R. No. 161796 | RULING #2  (similarity 0.750, distance 0.500)\n   \
             The petition is DENIED.\n   SO ORDERED.\n"
        );
    }

    #[test]
    fn test_human_output_empty() {
        let out = OutputFormatter::new(OutputFormat::Human).format_hits("x", &[]).unwrap();
        assert_eq!(out, "No results for \"x\".\n");
    }

    #[test]
    fn test_json_output_shape() {
        let out = OutputFormatter::new(OutputFormat::Json).format_hits("q", &[hit()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["results"][0]["case_no"], "G.R. No. 161796");
        assert_eq!(value["results"][0]["similarity"], 0.75);
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
    }
}
