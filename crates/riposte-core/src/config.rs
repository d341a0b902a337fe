//! # Responder Configuration
//!
//! Serde model of the responder settings and the builder that turns them
//! into a `LogicChain`.
//!
//! Parsing the file itself is done by the application (TOML); this module
//! only defines the shape and its defaults.

use crate::comparator::ComparatorKind;
use crate::corpus::ResponseMatch;
use crate::logic::{BestMatch, LogicChain, SpecificResponse};
use crate::tiebreak::TieBreakKind;
use crate::types::RiposteError;
use serde::{Deserialize, Serialize};

/// One fixed input/output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecificResponseConfig {
    pub input: String,
    pub output: String,
}

/// Responder settings. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponderConfig {
    /// Statement similarity measure.
    pub comparator: ComparatorKind,
    /// Strategy among several recorded replies.
    pub tie_break: TieBreakKind,
    /// How recorded contexts are matched against the chosen statement.
    pub response_match: ResponseMatch,
    /// Record each input as a reply to the previous response.
    pub learn: bool,
    /// Fixed replies, consulted before the closest-match search.
    pub specific_responses: Vec<SpecificResponseConfig>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            comparator: ComparatorKind::default(),
            tie_break: TieBreakKind::default(),
            response_match: ResponseMatch::default(),
            learn: true,
            specific_responses: Vec::new(),
        }
    }
}

impl ResponderConfig {
    /// Reject settings that parse but cannot work.
    pub fn validate(&self) -> Result<(), RiposteError> {
        if let Some(pair) = self.specific_responses.iter().find(|p| p.output.is_empty()) {
            return Err(RiposteError::InvalidConfig(format!(
                "specific response for {:?} has an empty output",
                pair.input
            )));
        }
        Ok(())
    }

    /// Build the adapter chain: fixed replies first, then closest match.
    ///
    /// Earlier adapters win confidence ties, so a fixed reply beats an
    /// equally confident closest match.
    pub fn build_chain(&self) -> Result<LogicChain, RiposteError> {
        self.validate()?;

        let mut chain = LogicChain::new();
        for pair in &self.specific_responses {
            chain.push(SpecificResponse::new(pair.input.clone(), pair.output.clone()));
        }
        chain.push(
            BestMatch::new(self.comparator.build())
                .with_tie_break(self.tie_break.build())
                .with_response_match(self.response_match),
        );
        Ok(chain)
    }
}

// =============================================================================
// TESTS
// =============================================================================
