//! # Logic Module
//!
//! Logic adapters turn an input statement into a scored response.
//!
//! - `BestMatch`: closest known statement, then one of its recorded replies
//! - `SpecificResponse`: a fixed reply to one fixed input
//! - `LogicChain`: runs several adapters and keeps the most confident answer
//!
//! Adapters hold no corpus handle and no RNG. Both are passed into each call,
//! so one chain can serve any number of concurrent requests.

pub mod best_match;
pub mod specific_response;

pub use best_match::BestMatch;
pub use specific_response::SpecificResponse;

use crate::corpus::CorpusAccessor;
use crate::types::{RiposteError, Statement};
use rand::RngCore;

/// A strategy that can answer some inputs.
pub trait LogicAdapter: Send + Sync {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Whether this adapter should be consulted for `input`.
    ///
    /// Must be side-effect free.
    fn can_process(
        &self,
        corpus: &dyn CorpusAccessor,
        input: &Statement,
    ) -> Result<bool, RiposteError>;

    /// Produce a response with its confidence set.
    fn process(
        &self,
        corpus: &dyn CorpusAccessor,
        input: &Statement,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, RiposteError>;
}

// =============================================================================
// LOGIC CHAIN
// =============================================================================

/// Ordered list of adapters; the most confident answer wins.
#[derive(Default)]
pub struct LogicChain {
    adapters: Vec<Box<dyn LogicAdapter>>,
}

impl std::fmt::Debug for LogicChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.name()))
            .finish()
    }
}

impl LogicChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an adapter (builder style).
    #[must_use]
    pub fn with_adapter(mut self, adapter: impl LogicAdapter + 'static) -> Self {
        self.push(adapter);
        self
    }

    /// Append an adapter.
    pub fn push(&mut self, adapter: impl LogicAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Number of adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Check if the chain has no adapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Adapter names in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.iter().map(|a| a.name())
    }

    /// True if at least one adapter can process `input`.
    pub fn can_process(
        &self,
        corpus: &dyn CorpusAccessor,
        input: &Statement,
    ) -> Result<bool, RiposteError> {
        for adapter in &self.adapters {
            if adapter.can_process(corpus, input)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Ask every capable adapter and return the most confident answer.
    ///
    /// Strictly higher confidence replaces the current answer, so the
    /// earliest adapter wins ties. `EmptyCorpus` from one adapter is skipped;
    /// any other error aborts the call. With no answer at all the result is
    /// `EmptyCorpus`.
    pub fn process(
        &self,
        corpus: &dyn CorpusAccessor,
        input: &Statement,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, RiposteError> {
        let mut best: Option<Statement> = None;

        for adapter in &self.adapters {
            if !adapter.can_process(corpus, input)? {
                tracing::debug!(adapter = adapter.name(), "Adapter cannot process input");
                continue;
            }

            let answer = match adapter.process(corpus, input, rng) {
                Ok(answer) => answer,
                Err(RiposteError::EmptyCorpus) => {
                    tracing::debug!(adapter = adapter.name(), "Adapter found no data");
                    continue;
                }
                Err(e) => return Err(e),
            };

            tracing::info!(
                adapter = adapter.name(),
                response = %answer.text,
                confidence = %answer.confidence,
                "Adapter produced a response"
            );

            let replace = best
                .as_ref()
                .is_none_or(|current| answer.confidence > current.confidence);
            if replace {
                best = Some(answer);
            }
        }

        best.ok_or(RiposteError::EmptyCorpus)
    }
}

// =============================================================================
// TESTS
// =============================================================================
