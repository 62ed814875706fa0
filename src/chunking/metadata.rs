//! Case metadata heuristics

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Number of leading non-empty lines searched for a title
const TITLE_SEARCH_LINES: usize = 20;

/// Identifying details of a decision, taken from its text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    /// Docket number as written, e.g. `G.R. No. 161796`
    pub case_no: Option<String>,
    /// `FIRST DIVISION`, `SECOND DIVISION`, `THIRD DIVISION` or `EN BANC`
    pub division: Option<String>,
    pub title: Option<String>,
}

fn case_no_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"G\.\s*R\.\s*Nos?\.\s*([A-Za-z0-9\-]+)").expect("Invalid case number regex")
    })
}

fn division_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(FIRST|SECOND|THIRD)\s+DIVISION\b|\bEN\s+BANC\b")
            .expect("Invalid division regex")
    })
}

fn boilerplate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Republic of the Philippines|Supreme Court")
            .expect("Invalid boilerplate regex")
    })
}

/// Extracts the G.R. number, division and title from a decision's text.
///
/// The title is the first of the leading non-empty lines that is not the
/// "Republic of the Philippines" / "Supreme Court" letterhead.
pub fn extract_case_metadata(text: &str) -> CaseMetadata {
    let case_no = case_no_regex()
        .find(text)
        .map(|m| m.as_str().to_string());

    let division = division_regex()
        .find(text)
        .map(|m| m.as_str().to_uppercase());

    let title = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_SEARCH_LINES)
        .find(|line| !boilerplate_regex().is_match(line))
        .map(str::to_string);

    CaseMetadata {
        case_no,
        division,
        title,
    }
}
