//! HTML extraction for e-library pages
//!
//! All functions take raw HTML and return owned data, so no parsed document
//! is ever held across an `.await`.

use super::{MonthLink, ScrapeError};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

pub const MONTH_ABBRS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Elements that may hold a bare year acting as a heading on the index page
const YEAR_HEADING_TAGS: &[&str] = &["strong", "b", "span", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Subtrees that never contain decision text
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("Invalid selector {}: {:?}", css, e))
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:19|20)\d{2}$").expect("Invalid year regex"))
}

fn href_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/((?:19|20)\d{2})/").expect("Invalid href year regex"))
}

fn case_no_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:[A-Z]\.[A-Z]\.\s*No\.\s*\d+|[A-Z]{1,5}(?:-\d+)+)\b")
            .expect("Invalid case number regex")
    })
}

fn blank_lines_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}").expect("Invalid blank line regex"))
}

/// Text of `el` with each text node trimmed, empty ones dropped, joined by `sep`
fn stripped_text(el: ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// First element matching one of `candidates`, else the document root
fn main_container<'a>(doc: &'a Html, candidates: &[&'static str]) -> ElementRef<'a> {
    candidates
        .iter()
        .find_map(|css| doc.select(&selector(css)).next())
        .unwrap_or_else(|| doc.root_element())
}

fn parse_base(base_url: &str) -> Result<Url, ScrapeError> {
    Url::parse(base_url).map_err(|e| ScrapeError::InvalidUrl {
        url: base_url.to_string(),
        error: e.to_string(),
    })
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}

/// Collects the month links of the index page, in document order.
///
/// The year of a link comes from its URL (`.../docmonth/Jan/1996/1`) when
/// present, else from the nearest preceding year heading. Two links for the
/// same year and month keep the position of the first and the URL of the last.
pub fn find_month_links(html: &str, base_url: &str) -> Result<Vec<MonthLink>, ScrapeError> {
    let base = parse_base(base_url)?;
    let doc = Html::parse_document(html);
    let container = main_container(&doc, &["#content", "body"]);

    let mut links: Vec<MonthLink> = Vec::new();
    let mut current_year: Option<String> = None;

    for node in container.descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        let name = el.value().name();

        if YEAR_HEADING_TAGS.contains(&name) {
            let text = stripped_text(el, "");
            if year_regex().is_match(&text) {
                current_year = Some(text);
            }
        }

        if name != "a" {
            continue;
        }
        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let label = stripped_text(el, "");
        if !MONTH_ABBRS.contains(&label.as_str()) {
            continue;
        }
        let Some(url) = resolve(&base, href) else {
            continue;
        };

        let year = href_year_regex()
            .captures(&url)
            .map(|c| c[1].to_string())
            .or_else(|| current_year.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let link = MonthLink {
            year,
            month: label,
            url,
        };
        match links.iter_mut().find(|l| l.key() == link.key()) {
            Some(existing) => existing.url = link.url,
            None => links.push(link),
        }
    }

    Ok(links)
}

/// Collects links to individual decisions from a month page.
///
/// A decision link is an anchor whose text looks like a docket number
/// (`G.R. No. 275832`, `A.C. No. 7941`, `OCA-12-3`). Printer-friendly
/// variants are ignored and duplicates removed, preserving order.
pub fn find_decision_links(html: &str, base_url: &str) -> Result<Vec<String>, ScrapeError> {
    let base = parse_base(base_url)?;
    let doc = Html::parse_document(html);
    let content = main_container(&doc, &["#content", "div.content", "div.inner", "body"]);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for a in content.select(&selector("a[href]")) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let text = stripped_text(a, " ");

        if text.is_empty() || MONTH_ABBRS.contains(&text.as_str()) {
            continue;
        }
        if href.to_lowercase().contains("printer") {
            continue;
        }
        if !case_no_regex().is_match(&text) {
            continue;
        }

        if let Some(url) = resolve(&base, href) {
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }

    Ok(links)
}

/// Extracts `(title, text)` from a decision page.
///
/// Text nodes inside scripts, styles and page chrome are skipped; the rest
/// are trimmed and joined by newlines.
pub fn extract_decision_text(html: &str) -> (String, String) {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&selector("title"))
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let main = main_container(&doc, &["#content", "div.content", "article", "body"]);
    let main_id = main.id();

    let mut pieces: Vec<&str> = Vec::new();
    for node in main.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|a| a.id() != main_id)
            .filter_map(ElementRef::wrap)
            .any(|el| NON_CONTENT_TAGS.contains(&el.value().name()));
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed);
        }
    }

    let text = blank_lines_regex()
        .replace_all(&pieces.join("\n"), "\n\n")
        .into_owned();

    (title, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://elibrary.judiciary.gov.ph/";

    #[test]
    fn test_month_links_use_href_year_then_heading() {
        let html = r#"<html><body><div id="content">
            <h3>1996</h3>
            <a href="/thebookshelf/docmonth/Jan/1996/1">Jan</a>
            <a href="/thebookshelf/docmonth/Feb/x">Feb</a>
            <strong>1997</strong>
            <a href="/docmonth/Mar">Mar</a>
            <a href="/about">About</a>
        </div></body></html>"#;

        let links = find_month_links(html, BASE).unwrap();
        let keys: Vec<String> = links.iter().map(MonthLink::key).collect();

        assert_eq!(keys, vec!["1996-Jan", "1996-Feb", "1997-Mar"]);
        assert_eq!(
            links[0].url,
            "https://elibrary.judiciary.gov.ph/thebookshelf/docmonth/Jan/1996/1"
        );
    }

    #[test]
    fn test_month_links_without_year_are_unknown() {
        let html = r#"<body><a href="/m/Apr">Apr</a></body>"#;
        let links = find_month_links(html, BASE).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].year, "unknown");
    }

    #[test]
    fn test_duplicate_month_keeps_first_position_last_url() {
        let html = r#"<body>
            <a href="/docmonth/Jan/2001/1">Jan</a>
            <a href="/docmonth/Feb/2001/1">Feb</a>
            <a href="/docmonth/Jan/2001/2">Jan</a>
        </body>"#;
        let links = find_month_links(html, BASE).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].key(), "2001-Jan");
        assert!(links[0].url.ends_with("/docmonth/Jan/2001/2"));
    }

    #[test]
    fn test_decision_links_filtering() {
        let html = r#"<body><div class="content">
            <a href="/showdocs/1/100">G.R. No. 275832</a>
            <a href="/showdocs/1/101">A.C. No. 7941</a>
            <a href="/showdocs/1/102">OCA-12-3456</a>
            <a href="/showdocsfriendly/printer/100">G.R. No. 275832</a>
            <a href="/showdocs/1/100">G.R. No. 275832</a>
            <a href="/docmonth/Jan/2001/1">Jan</a>
            <a href="/help">Help</a>
            <a href="/blank"> </a>
        </div></body>"#;

        let links = find_decision_links(html, BASE).unwrap();
        assert_eq!(
            links,
            vec![
                "https://elibrary.judiciary.gov.ph/showdocs/1/100",
                "https://elibrary.judiciary.gov.ph/showdocs/1/101",
                "https://elibrary.judiciary.gov.ph/showdocs/1/102",
            ]
        );
    }

    #[test]
    fn test_decision_links_scoped_to_content() {
        let html = r#"<body>
            <div id="menu"><a href="/showdocs/9/9">G.R. No. 9</a></div>
            <div id="content"><a href="/showdocs/1/1">G.R. No. 1</a></div>
        </body>"#;
        let links = find_decision_links(html, BASE).unwrap();
        assert_eq!(links, vec!["https://elibrary.judiciary.gov.ph/showdocs/1/1"]);
    }

    #[test]
    fn test_extract_decision_text_skips_chrome() {
        let html = r#"<html><head><title> G.R. No. 161796 </title>
            <script>var x = 1;</script></head>
            <body><header>E-Library</header>
            <div id="content">
              <nav>Home</nav>
              <p>THIRD DIVISION</p>
              <p>G.R. No. 161796</p>
              <script>track();</script>
              <p>The petition is <b>denied</b>.</p>
              <footer>Copyright</footer>
            </div></body></html>"#;

        let (title, text) = extract_decision_text(html);

        assert_eq!(title, "G.R. No. 161796");
        assert_eq!(text, "THIRD DIVISION\nG.R. No. 161796\nThe petition is\ndenied\n.");
    }

    #[test]
    fn test_extract_without_title_or_content() {
        let (title, text) = extract_decision_text("<html><body><p>Only body</p></body></html>");
        assert_eq!(title, "");
        assert_eq!(text, "Only body");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = find_decision_links("<body></body>", "not a url").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
    }
}
