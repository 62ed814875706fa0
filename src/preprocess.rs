//! Cleanup of crawled decision text
//!
//! E-library pages carry navigation and letterhead text above the decision
//! proper. The decision starts at its division heading (`THIRD DIVISION`,
//! `FIRST DIVISION`, ...), so everything before the first such line is cut.

use crate::util::jsonl;
use regex::Regex;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

fn division_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n([A-Z ]+DIVISION)\n").expect("Invalid division line regex"))
}

/// Drops everything before the first line consisting of an upper-case division name.
pub fn cut_before_division(text: &str) -> &str {
    match division_line_regex().find(text) {
        Some(m) => text[m.start() + 1..].trim_start(),
        None => text,
    }
}

/// Counters for a [`clean_jsonl`] run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    pub records: usize,
    pub trimmed: usize,
    pub malformed: usize,
}

/// Rewrites a decisions JSONL file with [`cut_before_division`] applied to each `text`.
///
/// All other fields are written back untouched, in their original order.
/// Lines that are not valid JSON are skipped.
pub fn clean_jsonl(input: &Path, output: &Path) -> io::Result<CleanStats> {
    let reader = BufReader::new(File::open(input)?);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(output)?);
    let mut stats = CleanStats::default();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut record: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping malformed JSON line");
                stats.malformed += 1;
                continue;
            }
        };

        if let Some(text) = record.get_mut("text") {
            let cleaned = text
                .as_str()
                .map(|s| (cut_before_division(s).to_string(), s.len()));
            if let Some((cleaned, original_len)) = cleaned {
                if cleaned.len() != original_len {
                    stats.trimmed += 1;
                }
                *text = Value::String(cleaned);
            }
        }

        jsonl::write_line(&mut writer, &record)?;
        stats.records += 1;
    }

    writer.flush()?;
    info!(
        records = stats.records,
        trimmed = stats.trimmed,
        malformed = stats.malformed,
        "Cleaned {}",
        output.display()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cut_removes_header() {
        let text = "Home | Search\nRepublic of the Philippines\nTHIRD DIVISION\n\nG.R. No. 1";
        assert_eq!(cut_before_division(text), "THIRD DIVISION\n\nG.R. No. 1");
    }

    #[test]
    fn test_cut_without_division_is_identity() {
        let text = "EN BANC\nG.R. No. 1";
        assert_eq!(cut_before_division(text), text);
    }

    #[test]
    fn test_cut_requires_heading_on_its_own_line() {
        let text = "intro\nassigned to the Third Division\nbody";
        assert_eq!(cut_before_division(text), text);
    }

    #[test]
    fn test_clean_jsonl_preserves_fields() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.jsonl");
        let output = dir.path().join("out").join("clean.jsonl");
        std::fs::write(
            &input,
            concat!(
                "{\"year\":\"1996\",\"month\":\"Jan\",\"title\":\"Ñ\",\"url\":\"u1\",\"text\":\"menu\\nFIRST DIVISION\\nbody\"}\n",
                "not json\n",
                "{\"url\":\"u2\",\"text\":\"no heading\"}\n",
            ),
        )
        .unwrap();

        let stats = clean_jsonl(&input, &output).unwrap();
        assert_eq!(
            stats,
            CleanStats {
                records: 2,
                trimmed: 1,
                malformed: 1
            }
        );

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[0],
            "{\"year\": \"1996\", \"month\": \"Jan\", \"title\": \"Ñ\", \"url\": \"u1\", \"text\": \"FIRST DIVISION\\nbody\"}"
        );
        assert_eq!(lines[1], "{\"url\": \"u2\", \"text\": \"no heading\"}");
    }
}
