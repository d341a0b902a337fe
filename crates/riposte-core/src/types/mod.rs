//! # Core Type Definitions
//!
//! This module contains the value types the matching pipeline operates on:
//! - Utterances (`Statement`) and recorded replies (`Response`)
//! - The storage row linking a statement to what it answered (`StatementRecord`)
//! - Error types (`RiposteError`)
//!
//! ## Identity
//!
//! `Statement` and `Response` compare and hash by `text` only. Confidence
//! and metadata never take part in identity, so a scored statement is still
//! "the same" statement as its stored counterpart.

use crate::confidence::Confidence;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Adapter-specific correlation metadata (e.g. a source message id).
///
/// Insertion-ordered; opaque to the matching core.
pub type ExtraData = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// STATEMENT
// =============================================================================

/// An utterance: either an input or a candidate from the corpus.
///
/// `confidence` is meaningful only immediately after a selector call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    /// The canonical utterance content. May be empty.
    pub text: String,
    /// Per-query match score.
    #[serde(default)]
    pub confidence: Confidence,
    /// Opaque correlation metadata.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_data: ExtraData,
}

impl Statement {
    /// Create a statement with zero confidence and no metadata.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: Confidence::zero(),
            extra_data: ExtraData::new(),
        }
    }

    /// Builder: set the confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: impl Into<Confidence>) -> Self {
        self.confidence = confidence.into();
        self
    }

    /// Builder: attach one metadata entry.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_data.insert(key.into(), value);
        self
    }

    /// Builder: replace the metadata map.
    #[must_use]
    pub fn with_extra_data(mut self, extra_data: ExtraData) -> Self {
        self.extra_data = extra_data;
        self
    }

    /// Get the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Statement {}

impl Hash for Statement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialEq<str> for Statement {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Statement {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// One observed reply associated with some statement context.
///
/// `occurrence` counts how many times the same reply was recorded for the
/// same context. It is always >= 1 and only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub occurrence: u64,
}

impl Response {
    /// Create a response seen once.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            occurrence: 1,
        }
    }

    /// Create a response with an explicit occurrence count (floored at 1).
    #[must_use]
    pub fn with_occurrence(text: impl Into<String>, occurrence: u64) -> Self {
        Self {
            text: text.into(),
            occurrence: occurrence.max(1),
        }
    }

    /// Count one more sighting, saturating at `u64::MAX`.
    pub fn increment(&mut self) {
        self.occurrence = self.occurrence.saturating_add(1);
    }

    /// Convert into a statement-shaped value with the given confidence.
    #[must_use]
    pub fn into_statement(self, confidence: Confidence) -> Statement {
        Statement::new(self.text).with_confidence(confidence)
    }
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Response {}

impl Hash for Response {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// STATEMENT RECORD (storage row)
// =============================================================================

/// What storage keeps per statement.
///
/// `in_response_to` lists the contexts this statement was given as a reply
/// to. Each entry's `text` is the context, its `occurrence` the number of
/// times this statement answered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub text: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_data: ExtraData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_response_to: Vec<Response>,
}

impl StatementRecord {
    /// Create a record with no links.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra_data: ExtraData::new(),
            in_response_to: Vec::new(),
        }
    }

    /// Link this record as a reply to `context`, or bump the existing link.
    pub fn link_to(&mut self, context: &str) {
        match self.in_response_to.iter_mut().find(|r| r.text == context) {
            Some(existing) => existing.increment(),
            None => self.in_response_to.push(Response::new(context)),
        }
    }

    /// Merge metadata; later values win per key.
    pub fn merge_extra(&mut self, extra: &ExtraData) {
        for (key, value) in extra {
            self.extra_data.insert(key.clone(), value.clone());
        }
    }

    /// Drop every link pointing at `context`. Returns true if any was removed.
    pub fn unlink(&mut self, context: &str) -> bool {
        let before = self.in_response_to.len();
        self.in_response_to.retain(|r| r.text != context);
        before != self.in_response_to.len()
    }

    /// A fresh, unscored statement view of this record.
    #[must_use]
    pub fn to_statement(&self) -> Statement {
        Statement::new(self.text.clone()).with_extra_data(self.extra_data.clone())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Riposte system.
///
/// - Degraded-mode fallbacks are not errors; only the conditions below are
/// - No silent failures: every variant reaches the caller
#[derive(Debug, Error)]
pub enum RiposteError {
    /// The corpus holds no statements at all; there is nothing to answer with.
    #[error("Corpus is empty")]
    EmptyCorpus,

    /// The corpus accessor failed to answer a query.
    #[error("Corpus accessor unavailable: {0}")]
    AccessorUnavailable(String),

    /// A statement was rejected by validation.
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// A configuration value could not be understood.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl RiposteError {
    /// Wrap any displayable storage failure as `AccessorUnavailable`.
    pub fn accessor(err: impl std::fmt::Display) -> Self {
        Self::AccessorUnavailable(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn statement_equality_ignores_confidence_and_metadata() {
        let a = Statement::new("hello").with_confidence(0.9);
        let b = Statement::new("hello").with_extra("id", serde_json::json!(7));
        assert_eq!(a, b);
        assert_ne!(a, Statement::new("hello!"));
    }

    #[test]
    fn statement_hash_is_by_text() {
        let mut set = HashSet::new();
        set.insert(Statement::new("hi").with_confidence(0.1));
        set.insert(Statement::new("hi").with_confidence(0.8));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn statement_compares_with_str() {
        assert!(Statement::new("ping") == "ping");
    }

    #[test]
    fn empty_text_is_a_valid_statement() {
        let s = Statement::new("");
        assert_eq!(s.as_str(), "");
        assert!(s.confidence.is_zero());
    }

    #[test]
    fn response_occurrence_floor_and_saturation() {
        assert_eq!(Response::with_occurrence("x", 0).occurrence, 1);

        let mut r = Response::with_occurrence("x", u64::MAX);
        r.increment();
        assert_eq!(r.occurrence, u64::MAX);
    }

    #[test]
    fn response_equality_is_by_text() {
        assert_eq!(
            Response::with_occurrence("hey", 3),
            Response::with_occurrence("hey", 1)
        );
    }

    #[test]
    fn record_link_increments_existing() {
        let mut record = StatementRecord::new("hi");
        record.link_to("hello");
        record.link_to("hello");
        record.link_to("good day");

        assert_eq!(record.in_response_to.len(), 2);
        assert_eq!(record.in_response_to[0].occurrence, 2);
        assert_eq!(record.in_response_to[1].occurrence, 1);
    }

    #[test]
    fn record_unlink() {
        let mut record = StatementRecord::new("hi");
        record.link_to("hello");
        assert!(record.unlink("hello"));
        assert!(!record.unlink("hello"));
        assert!(record.in_response_to.is_empty());
    }

    #[test]
    fn record_merge_extra_overwrites_per_key() {
        let mut record = StatementRecord::new("hi");
        let mut first = ExtraData::new();
        first.insert("source".into(), serde_json::json!("gitter"));
        record.merge_extra(&first);

        let mut second = ExtraData::new();
        second.insert("source".into(), serde_json::json!("hipchat"));
        second.insert("id".into(), serde_json::json!(12));
        record.merge_extra(&second);

        assert_eq!(record.extra_data["source"], serde_json::json!("hipchat"));
        assert_eq!(record.extra_data.len(), 2);
    }

    #[test]
    fn statement_json_shape() {
        let s = Statement::new("hey").with_confidence(0.5);
        let json = serde_json::to_value(&s).expect("serialize");
        assert_eq!(json, serde_json::json!({"text": "hey", "confidence": 0.5}));
    }

    #[test]
    fn statement_confidence_is_clamped_on_read() {
        let s: Statement =
            serde_json::from_str(r#"{"text":"a","confidence":7}"#).expect("deserialize");
        assert_eq!(s.confidence.value(), 1.0);
        assert!(s.confidence.is_confident());
    }
}
