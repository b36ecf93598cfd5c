//! Relevance scoring of candidates against a PRP

use crate::{
    error::truncate_for_error,
    model_caller::ModelCaller,
    prompts,
    prp::Prp,
    types::Candidate,
};
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Substituted when the model answers but no usable score can be read
pub(crate) const NEUTRAL_SCORE: f64 = 50.0;
const SCORE_SCAN_LINES: usize = 3;

static NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());

pub(crate) struct RelevanceScorer {
    caller: ModelCaller,
    disabled_score: f64,
    max_concurrent: usize,
}

impl RelevanceScorer {
    pub(crate) fn new(caller: ModelCaller, disabled_score: f64, max_concurrent: usize) -> Self {
        Self {
            caller,
            disabled_score,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Score one candidate in [0, 100]
    pub(crate) async fn score(&self, prp: &Prp<'_>, candidate: &Candidate) -> f64 {
        if !self.caller.is_enabled() {
            return self.disabled_score;
        }

        let description = candidate
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(candidate.snippet.as_str());
        let prompt = prompts::format_prompt(
            prompts::RELEVANCE_SCORE,
            &[
                ("prp", prp.text()),
                ("table_id", candidate.identity()),
                ("description", description),
                ("schema", &candidate.schema_summary()),
            ],
        );

        match self.caller.call(&prompt, "relevance_score").await {
            Some(response) => {
                let score = parse_score(&response);
                debug!("Scored {} at {score}", candidate.identity());
                score
            }
            None => NEUTRAL_SCORE,
        }
    }

    /// Score every candidate, preserving input order
    pub(crate) async fn score_all(&self, prp: &Prp<'_>, candidates: Vec<Candidate>) -> Vec<Candidate> {
        if !self.caller.is_enabled() {
            info!(
                "Completion model disabled, assigning flat score {} to {} candidates",
                self.disabled_score,
                candidates.len()
            );
        }

        stream::iter(candidates.into_iter().map(|mut candidate| async move {
            let score = self.score(prp, &candidate).await;
            candidate.attach_relevance_score(score);
            candidate
        }))
        .buffered(self.max_concurrent)
        .collect()
        .await
    }
}

/// First number in [0, 100] within the first lines of the response
pub(crate) fn parse_score(response: &str) -> f64 {
    let Some(pattern) = NUMBER_PATTERN.as_ref() else {
        return NEUTRAL_SCORE;
    };

    let found = response
        .lines()
        .take(SCORE_SCAN_LINES)
        .flat_map(|line| pattern.find_iter(line))
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .find(|value| (0.0..=100.0).contains(value));

    match found {
        Some(score) => score,
        None => {
            warn!(
                "No score in range found in response, using {NEUTRAL_SCORE}: {}",
                truncate_for_error(response)
            );
            NEUTRAL_SCORE
        }
    }
}
