//! Read-only view over a Product Requirement Prompt
//!
//! A PRP is markdown. Only named sections are ever pulled out of it, for
//! prompt construction and for the keyword fallback; nothing else about its
//! structure is interpreted.

use crate::error::truncate_chars;
use regex::Regex;
use std::sync::LazyLock;

pub const BUSINESS_OBJECTIVE: &str = "Business Objective";
pub const KEY_METRICS: &str = "Key Metrics";
pub const DIMENSIONS: &str = "Dimensions & Breakdowns";
pub const DATA_REQUIREMENTS: &str = "Data Requirements";

/// Sections the planner focuses on, in priority order
pub const PLANNING_SECTIONS: &[&str] =
    &[KEY_METRICS, DIMENSIONS, DATA_REQUIREMENTS, BUSINESS_OBJECTIVE];

const SUMMARY_OBJECTIVE_CHARS: usize = 200;
const SUMMARY_METRIC_CHARS: usize = 80;
const SUMMARY_METRIC_COUNT: usize = 3;

static BULLET_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s+(.+)$").ok());
static BOLD_LINE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\*\*|__)([^*_]+?):?(?:\*\*|__):?\s*$").ok());

#[derive(Debug, Clone, Copy)]
enum Heading<'a> {
    /// `#`..`######` heading with its level
    Markdown(usize, &'a str),
    /// A line that is entirely bold text
    Bold(&'a str),
}

impl<'a> Heading<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            if level <= 6 {
                return Some(Heading::Markdown(level, trimmed[level..].trim()));
            }
        }
        let pattern = BOLD_LINE_PATTERN.as_ref()?;
        let caps = pattern.captures(line)?;
        Some(Heading::Bold(caps.get(1)?.as_str()))
    }

    fn title(&self) -> &'a str {
        match self {
            Heading::Markdown(_, title) | Heading::Bold(title) => title,
        }
    }

    fn matches(&self, name: &str) -> bool {
        normalize_title(self.title()).contains(&name.to_lowercase())
    }
}

/// Lower-case a heading title and drop numbering and emphasis
fn normalize_title(title: &str) -> String {
    title
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c.is_whitespace())
        .replace(['*', '_', ':'], "")
        .trim()
        .to_lowercase()
}

/// Parsed view over PRP markdown
#[derive(Debug, Clone, Copy)]
pub struct Prp<'a> {
    text: &'a str,
}

impl<'a> Prp<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Body of the first section whose heading contains `name`
    /// (case-insensitive), or None if the PRP has no such section.
    pub fn section(&self, name: &str) -> Option<String> {
        let lines: Vec<&str> = self.text.lines().collect();
        let (start, heading) = lines
            .iter()
            .enumerate()
            .find_map(|(i, line)| match Heading::parse(line) {
                Some(h) if h.matches(name) => Some((i, h)),
                _ => None,
            })?;

        let body: Vec<&str> = lines[start + 1..]
            .iter()
            .take_while(|line| match (heading, Heading::parse(line)) {
                (_, None) => true,
                (Heading::Markdown(level, _), Some(Heading::Markdown(next, _))) => next > level,
                (_, Some(_)) => false,
            })
            .copied()
            .collect();

        let body = body.join("\n").trim().to_string();
        if body.is_empty() {
            None
        } else {
            Some(body)
        }
    }

    /// Bulleted (or numbered) item texts within a section
    pub fn bullets(&self, name: &str) -> Vec<String> {
        let Some(body) = self.section(name) else {
            return Vec::new();
        };
        let Some(pattern) = BULLET_PATTERN.as_ref() else {
            return Vec::new();
        };
        body.lines()
            .filter_map(|line| pattern.captures(line))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Short summary used to seed fan-out queries: the objective plus the
    /// first few key metrics, each truncated.
    pub fn summary(&self) -> String {
        let objective = self
            .section(BUSINESS_OBJECTIVE)
            .map(|body| truncate_chars(&collapse_whitespace(&body), SUMMARY_OBJECTIVE_CHARS));

        let metrics: Vec<String> = self
            .bullets(KEY_METRICS)
            .iter()
            .take(SUMMARY_METRIC_COUNT)
            .map(|m| truncate_chars(&strip_emphasis(m), SUMMARY_METRIC_CHARS))
            .collect();

        match (objective, metrics.is_empty()) {
            (Some(objective), false) => {
                format!("{objective} Key metrics: {}", metrics.join("; "))
            }
            (Some(objective), true) => objective,
            (None, false) => format!("Key metrics: {}", metrics.join("; ")),
            (None, true) => truncate_chars(
                &collapse_whitespace(&strip_emphasis(self.text)),
                SUMMARY_OBJECTIVE_CHARS,
            ),
        }
    }

    /// Concatenated planning sections, or the whole PRP when none exist
    pub fn planning_context(&self) -> String {
        let sections: Vec<String> = PLANNING_SECTIONS
            .iter()
            .filter_map(|name| self.section(name).map(|body| format!("## {name}\n{body}")))
            .collect();
        if sections.is_empty() {
            self.text.to_string()
        } else {
            sections.join("\n\n")
        }
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove markdown emphasis markers and surrounding quotes
pub(crate) fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
        .replace("__", "")
        .replace(['*', '`'], "")
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PRP: &str = "# Churn Dashboard PRP

## 1. Business Objective
Reduce subscriber churn by identifying
at-risk accounts early.

## Key Metrics
- **Monthly Churn Rate**: share of subscribers cancelling
- **Net Revenue Retention**
- **Active Subscribers**: distinct paying accounts
- **Average Tenure**

### Notes
Metrics are computed monthly.

## Dimensions & Breakdowns
* Region
* Plan tier

**Data Requirements**
1. Subscription events with timestamps
2. Billing history
";

    #[test]
    fn test_section_by_markdown_heading() {
        let prp = Prp::new(PRP);
        assert_eq!(
            prp.section(BUSINESS_OBJECTIVE).as_deref(),
            Some("Reduce subscriber churn by identifying\nat-risk accounts early.")
        );
    }

    #[test]
    fn test_section_includes_deeper_subheadings() {
        let body = Prp::new(PRP).section(KEY_METRICS).unwrap();
        assert!(body.contains("Average Tenure"));
        assert!(body.contains("Metrics are computed monthly."));
        assert!(!body.contains("Region"));
    }

    #[test]
    fn test_section_by_bold_heading() {
        let prp = Prp::new(PRP);
        assert_eq!(
            prp.bullets(DATA_REQUIREMENTS),
            vec![
                "Subscription events with timestamps".to_string(),
                "Billing history".to_string()
            ]
        );
    }

    #[test]
    fn test_section_case_insensitive_and_missing() {
        let prp = Prp::new(PRP);
        assert!(prp.section("key metrics").is_some());
        assert!(prp.section("Success Criteria").is_none());
    }

    #[test]
    fn test_bullets_with_star_markers() {
        assert_eq!(
            Prp::new(PRP).bullets(DIMENSIONS),
            vec!["Region".to_string(), "Plan tier".to_string()]
        );
    }

    #[test]
    fn test_summary_combines_objective_and_three_metrics() {
        let summary = Prp::new(PRP).summary();
        assert!(summary.starts_with("Reduce subscriber churn by identifying at-risk accounts early."));
        assert!(summary.contains("Monthly Churn Rate: share of subscribers cancelling"));
        assert!(summary.contains("Active Subscribers"));
        assert!(!summary.contains("Average Tenure"));
    }

    #[test]
    fn test_summary_without_sections_uses_text() {
        let summary = Prp::new("We need **weekly** sales numbers by store.").summary();
        assert_eq!(summary, "We need weekly sales numbers by store.");
    }

    #[test]
    fn test_planning_context_falls_back_to_text() {
        let text = "Just a paragraph.";
        assert_eq!(Prp::new(text).planning_context(), text);
        assert!(Prp::new(PRP)
            .planning_context()
            .starts_with("## Key Metrics\n"));
    }

    #[test]
    fn test_strip_emphasis() {
        assert_eq!(strip_emphasis("**\"Revenue by region\"**"), "Revenue by region");
        assert_eq!(strip_emphasis("`orders`"), "orders");
    }
}
