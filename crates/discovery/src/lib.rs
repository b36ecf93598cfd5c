//! PRP-driven table discovery
//!
//! This crate turns a Product Requirement Prompt into a ranked set of data
//! tables by planning search queries, collecting and deduplicating
//! candidates, escalating to broader fan-out queries when results are
//! sparse, and validating or scoring candidates with a completion model.
//!
//! # Public API
//!
//! ## Main Entry Point
//! - [`DiscoveryOrchestrator`] - Runs the keyword-list and structured-plan flows
//!
//! ## Request/Response Models
//! - [`DiscoveryRequest`] / [`DiscoveryResponse`] - Keyword-list flow input and output
//! - [`DiscoveryMetadata`] - Per-run observability record
//! - [`SearchPlan`], [`SearchStep`], [`TargetColumn`], [`StepResult`] - Structured-plan flow
//! - [`Candidate`] and [`CandidateSet`] - Discovered tables and their dedup map
//!
//! ## Model
//! - [`ClaudeCompletionModel`] and [`create_completion_model`] - Anthropic-backed completion
//!
//! ## Error Handling
//! - [`DiscoveryError`] - Fatal error types
//! - [`Result`] - Result type alias
//!
//! Prompt templates, the retrying model caller and the individual pipeline
//! components are private.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

// Private modules - implementation details
mod claude;
mod collector;
mod error;
mod fanout;
mod json;
mod keywords;
mod model_caller;
mod orchestrator;
mod planner;
mod prompts;
mod prp;
mod scorer;
mod types;
mod validator;

// Public re-exports - narrow API surface
pub use claude::{create_completion_model, ClaudeCompletionModel};
pub use collector::CandidateSet;
pub use error::{DiscoveryError, Result};
pub use orchestrator::DiscoveryOrchestrator;
pub use prp::{Prp, BUSINESS_OBJECTIVE, DATA_REQUIREMENTS, DIMENSIONS, KEY_METRICS};
pub use types::{
    Candidate, DiscoveryMetadata, DiscoveryRequest, DiscoveryResponse, GeneratedQueries,
    QueryExecution, QueryRefinement, QueryResult, QuerySource, QueryStatus, SearchPlan,
    SearchStep, StepResult, TargetColumn,
};
