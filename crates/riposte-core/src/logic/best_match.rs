//! # Best Match
//!
//! Answers with a recorded reply to the known statement closest to the input.
//!
//! 1. `select`: argmax of the comparator over every statement that has at
//!    least one recorded reply. Only a strictly higher score replaces the
//!    current best, so the first of equal maxima wins.
//! 2. `process`: fetch the replies recorded for the match, let the
//!    tie-break choose one, and give it the match confidence.
//!
//! Empty results degrade to a random corpus statement with zero confidence.
//! Accessor failures never degrade; they propagate unchanged.

use super::LogicAdapter;
use crate::comparator::Comparator;
use crate::confidence::Confidence;
use crate::corpus::{CorpusAccessor, ResponseMatch};
use crate::tiebreak::{TieBreak, UniformRandom};
use crate::types::{RiposteError, Statement};
use rand::RngCore;

/// Closest-match logic adapter.
pub struct BestMatch {
    comparator: Box<dyn Comparator>,
    tie_break: Box<dyn TieBreak>,
    response_match: ResponseMatch,
}

impl std::fmt::Debug for BestMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestMatch")
            .field("comparator", &self.comparator.name())
            .field("tie_break", &self.tie_break.name())
            .field("response_match", &self.response_match)
            .finish()
    }
}

impl BestMatch {
    /// Create with uniform random tie-break and substring reply matching.
    #[must_use]
    pub fn new(comparator: Box<dyn Comparator>) -> Self {
        Self {
            comparator,
            tie_break: Box::new(UniformRandom),
            response_match: ResponseMatch::default(),
        }
    }

    #[must_use]
    pub fn with_tie_break(mut self, tie_break: Box<dyn TieBreak>) -> Self {
        self.tie_break = tie_break;
        self
    }

    #[must_use]
    pub fn with_response_match(mut self, response_match: ResponseMatch) -> Self {
        self.response_match = response_match;
        self
    }

    /// The known statement closest to `input`, with its score as confidence.
    ///
    /// When nothing scores above zero the input itself comes back with zero
    /// confidence.
    pub fn select(
        &self,
        corpus: &dyn CorpusAccessor,
        input: &Statement,
    ) -> Result<Statement, RiposteError> {
        let candidates = corpus.statements_with_responses()?;

        if candidates.is_empty() {
            if corpus.count()? == 0 {
                return Err(RiposteError::EmptyCorpus);
            }
            tracing::info!("No statements have known responses, choosing a random statement");
            return Ok(corpus
                .random_statement()?
                .with_confidence(Confidence::zero()));
        }

        let mut closest = input.clone().with_confidence(Confidence::zero());

        for candidate in candidates {
            let confidence = self.comparator.compare(input, &candidate);
            if confidence > closest.confidence {
                closest = candidate.with_confidence(confidence);
            }
        }

        Ok(closest)
    }
}

impl LogicAdapter for BestMatch {
    fn name(&self) -> &'static str {
        "best_match"
    }

    fn can_process(
        &self,
        corpus: &dyn CorpusAccessor,
        _input: &Statement,
    ) -> Result<bool, RiposteError> {
        Ok(corpus.count()? > 0)
    }

    fn process(
        &self,
        corpus: &dyn CorpusAccessor,
        input: &Statement,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, RiposteError> {
        let closest = self.select(corpus, input)?;
        tracing::info!(
            input = %input.text,
            closest = %closest.text,
            confidence = %closest.confidence,
            comparator = self.comparator.name(),
            "Using close match"
        );

        let mut responses = corpus.responses_containing(&closest.text, self.response_match)?;

        if let Some(index) = self.tie_break.pick(&responses, rng) {
            tracing::info!(
                count = responses.len(),
                tie_break = self.tie_break.name(),
                "Selecting response from optimal responses"
            );
            let response = responses.swap_remove(index).into_statement(closest.confidence);
            tracing::info!(response = %response.text, "Response selected");
            return Ok(response);
        }

        tracing::info!(
            closest = %closest.text,
            "No response found, selecting a random statement"
        );
        Ok(corpus
            .random_statement()?
            .with_confidence(Confidence::zero()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{ExactMatch, LevenshteinDistance};
    use crate::corpus::CorpusStore;
    use crate::storage::MemoryCorpus;
    use crate::tiebreak::First;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn greeting_corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::with_seed(3);
        corpus.record(&Statement::new("hello"), None).expect("record");
        corpus
            .record(&Statement::new("hi"), Some("hello"))
            .expect("record");
        corpus
            .record(&Statement::new("hey"), Some("hello"))
            .expect("record");
        corpus.record(&Statement::new("bye"), None).expect("record");
        corpus
            .record(&Statement::new("goodbye"), Some("bye"))
            .expect("record");
        corpus
    }

    #[test]
    fn select_on_empty_corpus_fails() {
        let adapter = BestMatch::new(Box::new(ExactMatch));
        let corpus = MemoryCorpus::new();
        assert!(matches!(
            adapter.select(&corpus, &Statement::new("hello")),
            Err(RiposteError::EmptyCorpus)
        ));
    }

    #[test]
    fn select_without_links_returns_random_statement() {
        let mut corpus = MemoryCorpus::with_seed(1);
        corpus.record(&Statement::new("alpha"), None).expect("record");
        corpus.record(&Statement::new("beta"), None).expect("record");

        let adapter = BestMatch::new(Box::new(ExactMatch));
        let chosen = adapter
            .select(&corpus, &Statement::new("alpha"))
            .expect("select");
        assert!(chosen.confidence.is_zero());
        assert!(chosen.text == "alpha" || chosen.text == "beta");
    }

    #[test]
    fn select_finds_exact_match() {
        let adapter = BestMatch::new(Box::new(ExactMatch));
        let chosen = adapter
            .select(&greeting_corpus(), &Statement::new("hello"))
            .expect("select");
        assert_eq!(chosen.text, "hello");
        assert!((chosen.confidence.value() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn select_miss_returns_input_at_zero() {
        let adapter = BestMatch::new(Box::new(ExactMatch));
        let input = Statement::new("xyz123").with_extra("id", serde_json::json!(9));
        let chosen = adapter.select(&greeting_corpus(), &input).expect("select");
        assert_eq!(chosen.text, "xyz123");
        assert!(chosen.confidence.is_zero());
        assert_eq!(chosen.extra_data["id"], serde_json::json!(9));
    }

    #[test]
    fn select_prefers_closer_statement() {
        let adapter = BestMatch::new(Box::new(LevenshteinDistance));
        let chosen = adapter
            .select(&greeting_corpus(), &Statement::new("helo"))
            .expect("select");
        assert_eq!(chosen.text, "hello");
        assert!(chosen.confidence.value() > 0.5);
    }

    #[test]
    fn process_propagates_match_confidence() {
        let adapter = BestMatch::new(Box::new(LevenshteinDistance));
        let corpus = greeting_corpus();
        let input = Statement::new("helo");
        let closest = adapter.select(&corpus, &input).expect("select");

        let mut rng = StdRng::seed_from_u64(5);
        let answer = adapter.process(&corpus, &input, &mut rng).expect("process");
        assert!(answer.text == "hi" || answer.text == "hey");
        assert_eq!(answer.confidence, closest.confidence);
    }

    #[test]
    fn process_uses_configured_tie_break() {
        let adapter = BestMatch::new(Box::new(ExactMatch)).with_tie_break(Box::new(First));
        let corpus = greeting_corpus();
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..5 {
            let answer = adapter
                .process(&corpus, &Statement::new("hello"), &mut rng)
                .expect("process");
            assert_eq!(answer.text, "hi");
        }
    }

    #[test]
    fn process_falls_back_when_match_has_no_reply() {
        let corpus = greeting_corpus();
        let adapter = BestMatch::new(Box::new(ExactMatch)).with_response_match(ResponseMatch::Exact);
        let mut rng = StdRng::seed_from_u64(0);
        let answer = adapter
            .process(&corpus, &Statement::new("unknown"), &mut rng)
            .expect("process");
        assert!(answer.confidence.is_zero());
        assert!(corpus.find(&answer.text).expect("find").is_some());
    }

    #[test]
    fn can_process_tracks_corpus_size() {
        let adapter = BestMatch::new(Box::new(ExactMatch));
        let input = Statement::new("anything");
        assert!(!adapter.can_process(&MemoryCorpus::new(), &input).expect("gate"));
        assert!(adapter.can_process(&greeting_corpus(), &input).expect("gate"));
    }
}
