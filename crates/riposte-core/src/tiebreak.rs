//! # Tie-Break Module
//!
//! Picks one reply when several are recorded for the matched statement.
//!
//! Randomness is never global: the caller hands an RNG into every pick, so
//! a seeded RNG gives reproducible answers.

use crate::types::{Response, RiposteError};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Strategy choosing among candidate replies.
pub trait TieBreak: Send + Sync {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// Index of the chosen candidate, or `None` when `candidates` is empty.
    fn pick(&self, candidates: &[Response], rng: &mut dyn RngCore) -> Option<usize>;
}

/// Uniformly random candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRandom;

impl TieBreak for UniformRandom {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn pick(&self, candidates: &[Response], rng: &mut dyn RngCore) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        Some(rng.gen_range(0..candidates.len()))
    }
}

/// Random candidate weighted by how often it was recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceWeighted;

impl TieBreak for OccurrenceWeighted {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn pick(&self, candidates: &[Response], rng: &mut dyn RngCore) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        // Occurrence is >= 1 by construction, so the weights are never all zero.
        match WeightedIndex::<u64>::new(candidates.iter().map(|r| r.occurrence.max(1))) {
            Ok(dist) => Some(dist.sample(rng)),
            Err(e) => {
                tracing::warn!(error = %e, "Weighted pick failed, using first candidate");
                Some(0)
            }
        }
    }
}

/// Always the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

impl TieBreak for First {
    fn name(&self) -> &'static str {
        "first"
    }

    fn pick(&self, candidates: &[Response], _rng: &mut dyn RngCore) -> Option<usize> {
        (!candidates.is_empty()).then_some(0)
    }
}

/// Highest occurrence; the earliest candidate wins ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostFrequent;

impl TieBreak for MostFrequent {
    fn name(&self) -> &'static str {
        "most_frequent"
    }

    fn pick(&self, candidates: &[Response], _rng: &mut dyn RngCore) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            match best {
                Some((_, top)) if candidate.occurrence <= top => {}
                _ => best = Some((i, candidate.occurrence)),
            }
        }
        best.map(|(i, _)| i)
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Named tie-break choice, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakKind {
    #[default]
    Uniform,
    Weighted,
    First,
    MostFrequent,
}

impl TieBreakKind {
    /// Instantiate the strategy.
    #[must_use]
    pub fn build(self) -> Box<dyn TieBreak> {
        match self {
            Self::Uniform => Box::new(UniformRandom),
            Self::Weighted => Box::new(OccurrenceWeighted),
            Self::First => Box::new(First),
            Self::MostFrequent => Box::new(MostFrequent),
        }
    }
}

impl FromStr for TieBreakKind {
    type Err = RiposteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" | "random" => Ok(Self::Uniform),
            "weighted" | "occurrence" => Ok(Self::Weighted),
            "first" => Ok(Self::First),
            "most_frequent" | "most-frequent" => Ok(Self::MostFrequent),
            other => Err(RiposteError::InvalidConfig(format!(
                "Unknown tie-break: {}. Use: uniform, weighted, first, most_frequent",
                other
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn candidates() -> Vec<Response> {
        vec![
            Response::with_occurrence("hi", 3),
            Response::with_occurrence("hey", 1),
            Response::with_occurrence("yo", 3),
        ]
    }

    #[test]
    fn empty_candidates_yield_none() {
        let mut rng = StdRng::seed_from_u64(1);
        for kind in [
            TieBreakKind::Uniform,
            TieBreakKind::Weighted,
            TieBreakKind::First,
            TieBreakKind::MostFrequent,
        ] {
            assert_eq!(kind.build().pick(&[], &mut rng), None);
        }
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let c = candidates();
        for _ in 0..100 {
            let i = UniformRandom.pick(&c, &mut rng).expect("pick");
            assert!(i < c.len());
        }
    }

    #[test]
    fn uniform_is_reproducible_with_seed() {
        let c = candidates();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let picks_a: Vec<_> = (0..20).map(|_| UniformRandom.pick(&c, &mut a)).collect();
        let picks_b: Vec<_> = (0..20).map(|_| UniformRandom.pick(&c, &mut b)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn weighted_prefers_frequent_replies() {
        let c = vec![
            Response::with_occurrence("common", 50),
            Response::with_occurrence("rare", 1),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let common = (0..500)
            .filter(|_| OccurrenceWeighted.pick(&c, &mut rng) == Some(0))
            .count();
        assert!(common > 400, "common picked {} times", common);
    }

    #[test]
    fn first_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(First.pick(&candidates(), &mut rng), Some(0));
    }

    #[test]
    fn most_frequent_first_wins_ties() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(MostFrequent.pick(&candidates(), &mut rng), Some(0));

        let c = vec![
            Response::with_occurrence("a", 1),
            Response::with_occurrence("b", 2),
        ];
        assert_eq!(MostFrequent.pick(&c, &mut rng), Some(1));
    }

    #[test]
    fn kind_from_str() {
        assert_eq!(
            "most_frequent".parse::<TieBreakKind>().expect("parse"),
            TieBreakKind::MostFrequent
        );
        assert_eq!(
            "Random".parse::<TieBreakKind>().expect("parse"),
            TieBreakKind::Uniform
        );
        assert!(matches!(
            "loudest".parse::<TieBreakKind>(),
            Err(RiposteError::InvalidConfig(_))
        ));
    }
}
