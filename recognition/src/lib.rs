//! Recognition library - rule-driven classification of maintenance
//! descriptions.
//!
//! This crate provides:
//! - Text normalization for matching (`normalize`)
//! - Rule snapshots, caching and the store boundary (`rules`)
//! - Exact, synonym and approximate keyword matching (`matching`)
//! - Per-category confidence scoring (`scoring`)
//! - The two-dimension classification engine (`engine`)
//! - Audit record shapes for callers (`audit`)
//!
//! Feature flags:
//! - `cli`: Command-line interface

// Core modules (always compiled)
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
pub mod normalize;
pub mod rules;
pub mod scoring;

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{AnalysisResult, DetectedCategory, RecognitionEngine};
pub use rules::Dimension;
