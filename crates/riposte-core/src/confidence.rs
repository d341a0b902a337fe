//! # Confidence Module
//!
//! Confidence scoring for matched statements.
//!
//! - A confidence is a value in `[0, 1]`
//! - It is assigned per query and never persisted with a record
//! - Higher means the input context was understood better

use crate::primitives::CONFIDENT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence score attached to a selected statement.
///
/// Construction always clamps into `[0, 1]`, deserialization included;
/// `NaN` collapses to zero so that ordering comparisons in the selector stay
/// total in practice.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Create a confidence, clamping into `[0, 1]`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::zero();
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Zero confidence (nothing understood).
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Full confidence (exact understanding).
    #[must_use]
    pub const fn max() -> Self {
        Self(1.0)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Check if the score reaches `CONFIDENT_THRESHOLD`.
    #[must_use]
    pub fn is_confident(self) -> bool {
        self.0 >= CONFIDENT_THRESHOLD
    }

    /// Check if the score is exactly zero (a fallback or a miss).
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
