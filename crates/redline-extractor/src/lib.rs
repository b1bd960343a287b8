//! Redline Extractor - Clause classification and entity extraction
//!
//! Assigns each clause a type from the closed taxonomy and pulls
//! dates, amounts, parties, durations and locations out of its text.

use redline_core::{Clause, Entity};

pub mod classifier;
pub mod ner;

pub use classifier::ClauseClassifier;
pub use ner::RuleBasedNer;

/// Trait for entity extractors
///
/// Extraction never fails: matches that cannot be normalised are dropped.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, clause: &Clause) -> Vec<Entity>;
}
