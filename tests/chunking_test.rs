//! Chunking pipeline tests on decision-shaped text

use lexai::chunking::{build_rag_chunks, identify_section, split_into_sections, ChunkingConfig, SectionKind, FULL_TEXT};
use lexai::preprocess::cut_before_division;
use yare::parameterized;

const DECISION: &str = "Home | E-Library | Search\n\
Republic of the Philippines\n\
THIRD DIVISION\n\
G.R. No. 161796, February 08, 2012\n\
PEOPLE OF THE PHILIPPINES, PLAINTIFF-APPELLEE, VS. JUAN DELA CRUZ, ACCUSED-APPELLANT.\n\
D E C I S I O N\n\
This is an appeal from the decision of the Court of Appeals.\n\
The Facts\n\
The accused was charged with robbery before the Regional Trial Court. He pleaded not guilty. \
Trial ensued and the prosecution presented three witnesses. The defense relied on denial and alibi.\n\
Issue\n\
Whether the guilt of the accused was proven beyond reasonable doubt.\n\
Ruling\n\
The appeal lacks merit. Positive identification prevails over denial. \
The trial court did not err in giving credence to the prosecution witnesses.\n\
WHEREFORE, the appeal is DENIED.\n\
SO ORDERED.";

#[parameterized(
    decision_spaced = { "D E C I S I O N", Some(SectionKind::Decision) },
    syllabus = { "SYLLABUS", Some(SectionKind::Syllabus) },
    the_facts = { "The Facts", Some(SectionKind::Facts) },
    statement_of_facts = { "Statement of Facts:", Some(SectionKind::Facts) },
    issues = { "ISSUES", Some(SectionKind::Issues) },
    assigned_errors = { "Assigned Errors", Some(SectionKind::Issues) },
    ruling = { "  Ruling  ", Some(SectionKind::Ruling) },
    discussion = { "DISCUSSION", Some(SectionKind::Ruling) },
    so_ordered = { "SO ORDERED", Some(SectionKind::Wherefore) },
    wherefore_sentence = { "WHEREFORE, the appeal is DENIED.", None },
    prose = { "The facts show that he fled.", None },
    blank = { "   ", None },
)]
fn test_heading_detection(line: &str, expected: Option<SectionKind>) {
    assert_eq!(identify_section(line), expected);
}

#[test]
fn test_decision_sections_in_order() {
    let text = cut_before_division(DECISION);
    let names: Vec<String> = split_into_sections(text).into_iter().map(|s| s.name).collect();

    assert_eq!(names, vec!["PREAMBLE", "DECISION", "FACTS", "ISSUES", "RULING"]);
}

#[test]
fn test_decision_chunks_carry_metadata() {
    let text = cut_before_division(DECISION);
    assert!(text.starts_with("THIRD DIVISION"));

    let chunks = build_rag_chunks(text, &ChunkingConfig::default());
    assert!(!chunks.is_empty());

    for chunk in &chunks {
        assert_eq!(chunk.case_no.as_deref(), Some("G.R. No. 161796"));
        assert_eq!(chunk.division.as_deref(), Some("THIRD DIVISION"));
        assert_eq!(chunk.title.as_deref(), Some("THIRD DIVISION"));
    }

    let ruling = chunks.iter().find(|c| c.section == "RULING").unwrap();
    assert!(ruling.text.starts_with("RULING:"));
    assert!(ruling.text.contains("SO ORDERED."));
}

#[test]
fn test_small_chunks_restart_index_per_section() {
    let config = ChunkingConfig {
        max_tokens: 12,
        overlap_sentences: 1,
        min_chunk_words: 0,
    };
    let chunks = build_rag_chunks(cut_before_division(DECISION), &config);

    for section in ["FACTS", "RULING"] {
        let indexes: Vec<usize> = chunks
            .iter()
            .filter(|c| c.section == section)
            .map(|c| c.chunk_index)
            .collect();
        assert!(indexes.len() > 1, "{} should span several chunks", section);
        assert_eq!(indexes, (0..indexes.len()).collect::<Vec<_>>());
    }
}

#[test]
fn test_text_without_headings_is_full_text() {
    let chunks = build_rag_chunks(
        "A.C. No. 7941. Respondent lawyer is suspended for one year.",
        &ChunkingConfig::default(),
    );

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].section, FULL_TEXT);
    assert_eq!(chunks[0].case_no, None);
}
