//! PMID extraction.
//!
//! Collects PubMed identifiers written as `PMID:12345678` in Markdown text,
//! from line-oriented `pmids.txt` lists, and from literal arguments.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Matches `PMID:123`, `pmid : 123`, `PMID: 123` and captures the digits.
static PMID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPMID\s*:\s*([0-9]+)\b").expect("valid regex"));

/// Errors that can occur when collecting PMIDs.
#[derive(Error, Debug, PartialEq)]
pub enum CollectError {
    #[error("No PMIDs found.")]
    NoIdentifiers,
}

/// Returns true if `s` is a non-empty run of ASCII decimal digits.
pub fn is_pmid(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Extracts all `PMID:<digits>` markers from free text.
///
/// The marker is case-insensitive and may have whitespace around the colon.
/// Repeated PMIDs are kept once, at the position of their first occurrence.
///
/// # Examples
///
/// ```
/// use pmid_fetch::extract_pmids;
///
/// let pmids = extract_pmids("See PMID:123456 and PMID: 123456 again.");
/// assert_eq!(pmids, vec!["123456"]);
/// ```
pub fn extract_pmids(text: &str) -> Vec<String> {
    dedup(
        PMID_RE
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str().to_string()),
    )
}

/// Parses a `pmids.txt` list (one PMID per line).
///
/// Lines starting with `pmid` are scanned for a `PMID:<digits>` marker, lines
/// made only of digits are taken as-is, and anything else is ignored.
pub fn parse_pmid_list(content: &str) -> Vec<String> {
    let mut pmids = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if starts_with_marker(line) {
            if let Some(m) = PMID_RE.captures(line).and_then(|cap| cap.get(1)) {
                pmids.push(m.as_str().to_string());
            }
        } else if is_pmid(line) {
            pmids.push(line.to_string());
        }
    }

    dedup(pmids)
}

/// Combines all PMID sources into one deduplicated list.
///
/// Order of first appearance is kept across sources: Markdown text first,
/// then the PMID list, then literal arguments.
///
/// # Errors
///
/// Returns [`CollectError::NoIdentifiers`] if no valid PMID remains.
pub fn collect_pmids(
    markdown: Option<&str>,
    pmid_list: Option<&str>,
    literals: &[String],
) -> Result<Vec<String>, CollectError> {
    let mut candidates = Vec::new();

    if let Some(text) = markdown {
        candidates.extend(extract_pmids(text));
    }
    if let Some(content) = pmid_list {
        candidates.extend(parse_pmid_list(content));
    }
    candidates.extend(
        literals
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    );

    let pmids = dedup(candidates.into_iter().filter(|p| is_pmid(p)));
    if pmids.is_empty() {
        return Err(CollectError::NoIdentifiers);
    }

    Ok(pmids)
}

fn starts_with_marker(line: &str) -> bool {
    line.get(..4)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("pmid"))
}

fn dedup(pmids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    pmids
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
