//! Line-based section detection for court decisions

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Name of the text that precedes the first recognised heading
pub const PREAMBLE: &str = "PREAMBLE";

/// Name given to a decision in which no heading was recognised
pub const FULL_TEXT: &str = "FULL_TEXT";

/// Canonical headings recognised inside a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Decision,
    Syllabus,
    Facts,
    Issues,
    Ruling,
    Wherefore,
}

impl SectionKind {
    /// Matching order; the first kind with a matching pattern wins
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Decision,
        SectionKind::Syllabus,
        SectionKind::Facts,
        SectionKind::Issues,
        SectionKind::Ruling,
        SectionKind::Wherefore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Decision => "DECISION",
            SectionKind::Syllabus => "SYLLABUS",
            SectionKind::Facts => "FACTS",
            SectionKind::Issues => "ISSUES",
            SectionKind::Ruling => "RULING",
            SectionKind::Wherefore => "WHEREFORE",
        }
    }

    fn patterns(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Decision => &[r"\bD\sE\sC\sI\sS\sI\sO\sN\b"],
            SectionKind::Syllabus => &[r"\bSYLLABUS\b"],
            SectionKind::Facts => &[
                r"\bTHE\s+FACTS\b",
                r"\bSTATEMENT\s+OF\s+FACTS\b",
                r"\bFACTS\b",
            ],
            SectionKind::Issues => &[r"\bISSUES?\b", r"\bASSIGNED\s+ERRORS\b"],
            SectionKind::Ruling => &[
                r"\bRULING\b",
                r"\bDISCUSSION\b",
                r"\bTHE\s+COURT['’`]S?\s+RULING\b",
            ],
            SectionKind::Wherefore => &[r"\bWHEREFORE\b", r"\bSO\s+ORDERED\b"],
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-line, case-insensitive heading matchers in [`SectionKind::ALL`] order
fn heading_matchers() -> &'static [(SectionKind, Regex)] {
    static MATCHERS: OnceLock<Vec<(SectionKind, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        SectionKind::ALL
            .iter()
            .flat_map(|kind| {
                kind.patterns().iter().map(move |p| {
                    let re = Regex::new(&format!("(?i)^(?:{})$", p))
                        .expect("Invalid section heading regex");
                    (*kind, re)
                })
            })
            .collect()
    })
}

/// A named slice of a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub text: String,
}

/// Returns the section kind if `line` is a heading on its own.
///
/// Surrounding whitespace and trailing colons are ignored, so `"  Facts: "`
/// is a heading while `"The facts of the case are"` is not.
pub fn identify_section(line: &str) -> Option<SectionKind> {
    let stripped = line.trim().trim_end_matches(':').trim();
    if stripped.is_empty() {
        return None;
    }

    heading_matchers()
        .iter()
        .find(|(_, re)| re.is_match(stripped))
        .map(|(kind, _)| *kind)
}

/// Splits a decision into sections at heading lines.
///
/// Each section after a heading starts with `"{NAME}:"` and a blank line.
/// Sections whose trimmed text is empty are dropped. A decision without
/// any heading comes back as a single [`FULL_TEXT`] section.
pub fn split_into_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_name = PREAMBLE.to_string();
    let mut current_lines: Vec<String> = Vec::new();

    fn flush(sections: &mut Vec<Section>, name: &str, lines: &mut Vec<String>) {
        let content = lines.join("\n");
        let content = content.trim();
        if !content.is_empty() {
            sections.push(Section {
                name: name.to_string(),
                text: content.to_string(),
            });
        }
        lines.clear();
    }

    for line in text.split('\n') {
        match identify_section(line) {
            Some(kind) => {
                flush(&mut sections, &current_name, &mut current_lines);
                current_name = kind.as_str().to_string();
                current_lines.push(format!("{}:", kind));
                current_lines.push(String::new());
            }
            None => current_lines.push(line.to_string()),
        }
    }
    flush(&mut sections, &current_name, &mut current_lines);

    if sections.len() == 1 && sections[0].name == PREAMBLE {
        sections[0].name = FULL_TEXT.to_string();
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_plain_headings() {
        assert_eq!(identify_section("FACTS"), Some(SectionKind::Facts));
        assert_eq!(identify_section("  The Facts:  "), Some(SectionKind::Facts));
        assert_eq!(identify_section("D E C I S I O N"), Some(SectionKind::Decision));
        assert_eq!(identify_section("So Ordered."), None);
        assert_eq!(identify_section("SO ORDERED"), Some(SectionKind::Wherefore));
    }

    #[test]
    fn test_identify_rejects_prose() {
        assert_eq!(identify_section("The facts of the case are as follows"), None);
        assert_eq!(identify_section(""), None);
        assert_eq!(identify_section(":::"), None);
    }

    #[test]
    fn test_court_ruling_apostrophes() {
        for line in ["THE COURT'S RULING", "The Court’s Ruling", "THE COURT`S RULING"] {
            assert_eq!(identify_section(line), Some(SectionKind::Ruling), "{}", line);
        }
    }

    #[test]
    fn test_split_keeps_heading_inside_body() {
        let text = "THIRD DIVISION\nG.R. No. 1\n\nFACTS\n\nPetitioner sued.\n\nRULING:\nDenied.";
        let sections = split_into_sections(text);

        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["PREAMBLE", "FACTS", "RULING"]);
        assert_eq!(sections[1].text, "FACTS:\n\n\nPetitioner sued.");
        assert_eq!(sections[2].text, "RULING:\n\nDenied.");
    }

    #[test]
    fn test_split_without_headings_is_full_text() {
        let sections = split_into_sections("Just a memo.\nNothing else.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, FULL_TEXT);
        assert_eq!(sections[0].text, "Just a memo.\nNothing else.");
    }

    #[test]
    fn test_split_drops_empty_preamble() {
        let sections = split_into_sections("\n\nWHEREFORE\nThe petition is denied.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "WHEREFORE");
    }

    #[test]
    fn test_split_empty_text() {
        assert!(split_into_sections("").is_empty());
    }
}
