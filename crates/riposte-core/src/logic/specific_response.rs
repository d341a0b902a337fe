//! Fixed reply to one fixed input.

use super::LogicAdapter;
use crate::confidence::Confidence;
use crate::corpus::CorpusAccessor;
use crate::types::{RiposteError, Statement};
use rand::RngCore;

/// Answers `output` when the input text is exactly `input`.
#[derive(Debug, Clone)]
pub struct SpecificResponse {
    input: String,
    output: String,
}

impl SpecificResponse {
    #[must_use]
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    fn matches(&self, statement: &Statement) -> bool {
        statement.text == self.input
    }
}

impl LogicAdapter for SpecificResponse {
    fn name(&self) -> &'static str {
        "specific_response"
    }

    fn can_process(
        &self,
        _corpus: &dyn CorpusAccessor,
        input: &Statement,
    ) -> Result<bool, RiposteError> {
        Ok(self.matches(input))
    }

    fn process(
        &self,
        _corpus: &dyn CorpusAccessor,
        input: &Statement,
        _rng: &mut dyn RngCore,
    ) -> Result<Statement, RiposteError> {
        let confidence = if self.matches(input) {
            Confidence::max()
        } else {
            Confidence::zero()
        };
        Ok(Statement::new(self.output.clone()).with_confidence(confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCorpus;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn matching_input_is_fully_confident() {
        let adapter = SpecificResponse::new("ping", "pong");
        let corpus = MemoryCorpus::new();
        let mut rng = StdRng::seed_from_u64(0);

        assert!(adapter.can_process(&corpus, &Statement::new("ping")).expect("gate"));
        let answer = adapter
            .process(&corpus, &Statement::new("ping"), &mut rng)
            .expect("process");
        assert_eq!(answer.text, "pong");
        assert!((answer.confidence.value() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn other_input_scores_zero() {
        let adapter = SpecificResponse::new("ping", "pong");
        let corpus = MemoryCorpus::new();
        let mut rng = StdRng::seed_from_u64(0);

        assert!(!adapter.can_process(&corpus, &Statement::new("Ping")).expect("gate"));
        let answer = adapter
            .process(&corpus, &Statement::new("Ping"), &mut rng)
            .expect("process");
        assert!(answer.confidence.is_zero());
    }
}
