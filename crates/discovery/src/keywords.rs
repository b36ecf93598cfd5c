//! Deterministic keyword extraction used when the model cannot plan queries

use crate::prp::{strip_emphasis, Prp, PLANNING_SECTIONS};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Last-resort query when a PRP yields no usable terms at all
pub(crate) const DEFAULT_QUERY: &str = "business metrics fact tables";

const MIN_TERM_CHARS: usize = 3;
const MAX_TERM_WORDS: usize = 8;

static BOLD_SPAN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__").ok());

// Two or more consecutive capitalized words, e.g. "Net Revenue Retention"
static CAPITALIZED_PHRASE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-zA-Z]+(?:[ \t]+[A-Z][a-zA-Z]+)+\b").ok());

/// Key terms from the bulleted items of the planning sections.
///
/// A bullet contributes its first bold span, or failing that the text before
/// a `:` or ` - ` separator. Terms are lower-cased and deduplicated in order.
pub(crate) fn bullet_terms(prp: &Prp<'_>, max_terms: usize) -> Vec<String> {
    let terms = PLANNING_SECTIONS
        .iter()
        .flat_map(|section| prp.bullets(section))
        .filter_map(|item| bullet_term(&item));
    dedup_terms(terms, max_terms)
}

fn bullet_term(item: &str) -> Option<String> {
    let bold = BOLD_SPAN_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(item))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string());

    let raw = match bold {
        Some(term) => term,
        None => {
            let plain = strip_emphasis(item);
            let head = plain
                .split_once(':')
                .or_else(|| plain.split_once(" - "))
                .map(|(head, _)| head.to_string())
                .unwrap_or(plain);
            head.split_whitespace()
                .take(MAX_TERM_WORDS)
                .collect::<Vec<_>>()
                .join(" ")
        }
    };

    normalize_term(&raw)
}

/// Capitalized multi-word phrases anywhere in the PRP body, skipping
/// heading lines and the section names themselves.
pub(crate) fn capitalized_terms(text: &str, max_terms: usize) -> Vec<String> {
    let Some(pattern) = CAPITALIZED_PHRASE_PATTERN.as_ref() else {
        return Vec::new();
    };
    let section_names: HashSet<String> = PLANNING_SECTIONS
        .iter()
        .map(|name| name.to_lowercase())
        .collect();

    let terms = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| {
            let plain = strip_emphasis(line);
            pattern
                .find_iter(&plain)
                .map(|m| m.as_str().to_string())
                .collect::<Vec<_>>()
        })
        .filter_map(|phrase| normalize_term(&phrase))
        .filter(|term| !section_names.contains(term));

    dedup_terms(terms, max_terms)
}

fn normalize_term(raw: &str) -> Option<String> {
    let term = strip_emphasis(raw)
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase();
    (term.chars().count() >= MIN_TERM_CHARS).then_some(term)
}

/// Order-preserving dedup, capped at `max_terms`
fn dedup_terms(terms: impl Iterator<Item = String>, max_terms: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .filter(|term| seen.insert(term.clone()))
        .take(max_terms)
        .collect()
}
