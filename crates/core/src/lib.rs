//! Core types and traits for the tablescout discovery system
//!
//! This crate provides the foundational abstractions used throughout
//! tablescout, including:
//!
//! - **Search**: the `SearchBackend` trait and its request/response models
//! - **Completion**: the `CompletionModel` trait and typed `ModelError`
//! - **Configuration**: System configuration management
//! - **Error handling**: Unified error types
//!

pub mod completion;
pub mod config;
pub mod error;
pub mod search_api;
pub mod search_models;

// Re-export main types for convenience
pub use completion::{CompletionModel, ModelError, ModelErrorKind};
pub use config::{Config, DiscoveryConfig, ModelConfig, RetryConfig, SearchConfig};
pub use error::{Error, Result};
pub use search_api::SearchBackend;
