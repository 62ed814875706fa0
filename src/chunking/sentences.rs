//! Rule-based sentence segmentation tuned for Philippine court decisions
//!
//! A boundary is a run of `.`, `?` or `!` (plus closing quotes and brackets)
//! followed by whitespace. A period does not end a sentence after a known
//! abbreviation (`No.`, `Art.`, `Atty.`), after a single-letter initial or a
//! dotted acronym (`G.R.`), or when the next word starts in lower case.

use regex::Regex;
use std::sync::OnceLock;

const TERMINATORS: &[char] = &['.', '?', '!'];
const CLOSERS: &[char] = &['"', '\'', '”', '’', ')', ']'];
const OPENERS: &[char] = &['"', '\'', '“', '‘', '(', '['];

/// Lower-cased abbreviations, without their trailing period
const ABBREVIATIONS: &[&str] = &[
    // honorifics and titles
    "mr", "mrs", "ms", "dr", "atty", "jr", "sr", "hon", "col", "lt", "capt", "sgt", "maj", "msgr",
    "sen", "gov", "supt", "insp", "spo1", "spo2", "spo3", "po1", "po2", "po3",
    // citations
    "no", "nos", "art", "arts", "sec", "secs", "par", "pars", "para", "vol", "vols", "p", "pp",
    "ch", "chap", "vs", "v", "id", "ibid", "supra", "cf", "viz", "et", "al", "phil", "scra",
    // organisations and places
    "inc", "corp", "co", "ltd", "bros", "assn", "dept", "govt", "st", "ave", "blvd", "rd", "brgy",
    "mun", "prov",
    // months
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
    // misc
    "etc", "approx",
];

/// Letter-period runs such as `G.R`, `U.S` or `O.G` (the final period is the terminator)
fn dotted_acronym_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\p{L}\.)+\p{L}$").expect("Invalid acronym regex"))
}

fn is_abbreviation(word: &str) -> bool {
    let word = word.trim_start_matches(OPENERS);
    if word.is_empty() {
        return false;
    }

    let mut chars = word.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_alphabetic() {
            return true;
        }
    }

    if dotted_acronym_regex().is_match(word) {
        return true;
    }

    let lower = word.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

/// Splits `text` into trimmed, non-empty sentences
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (term_pos, c) = chars[i];
        if !TERMINATORS.contains(&c) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && (TERMINATORS.contains(&chars[j].1) || CLOSERS.contains(&chars[j].1))
        {
            j += 1;
        }

        // Needs whitespace after the punctuation and something after that
        if j >= chars.len() || !chars[j].1.is_whitespace() {
            i = j;
            continue;
        }
        let mut k = j;
        while k < chars.len() && chars[k].1.is_whitespace() {
            k += 1;
        }
        if k >= chars.len() {
            break;
        }

        let next = chars[k].1;
        let boundary = if c == '.' {
            let word_start = text[..term_pos]
                .rfind(char::is_whitespace)
                .map(|p| p + text[p..].chars().next().map_or(1, char::len_utf8))
                .unwrap_or(0);
            let word = &text[word_start..term_pos];
            !is_abbreviation(word) && !next.is_lowercase()
        } else {
            !next.is_lowercase()
        };

        if boundary {
            let end = chars[j].0;
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = chars[k].0;
        }
        i = k;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}
