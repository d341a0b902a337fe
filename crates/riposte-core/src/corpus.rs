//! # Corpus Module
//!
//! The narrow capability the matching core requires from storage.
//!
//! - `CorpusAccessor`: the read-only queries used by the selector
//! - `CorpusStore`: the write side, used by the application layer only
//!
//! The core never names a concrete backend; it is handed a
//! `&dyn CorpusAccessor` on every call.

use crate::types::{Response, RiposteError, Statement, StatementRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

// =============================================================================
// RESPONSE MATCHING MODE
// =============================================================================

/// How a recorded "in response to" context is matched against a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMatch {
    /// The context contains the text as a substring.
    #[default]
    Contains,
    /// The context equals the text.
    Exact,
}

impl ResponseMatch {
    /// Check one recorded context against the queried text.
    #[must_use]
    pub fn matches(self, context: &str, text: &str) -> bool {
        match self {
            Self::Contains => context.contains(text),
            Self::Exact => context == text,
        }
    }
}

impl FromStr for ResponseMatch {
    type Err = RiposteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            other => Err(RiposteError::InvalidConfig(format!(
                "Unknown response match mode: {}. Use: contains, exact",
                other
            ))),
        }
    }
}

// =============================================================================
// ACCESSOR TRAIT
// =============================================================================

/// Read-side corpus contract consumed by the matching core.
///
/// Implementations must support concurrent reads. Every storage failure is
/// reported as `RiposteError::AccessorUnavailable`; the core never retries.
pub trait CorpusAccessor: Send + Sync {
    /// Total number of distinct statements stored.
    fn count(&self) -> Result<usize, RiposteError>;

    /// All statements that have at least one recorded response, in a stable
    /// order, with zero confidence.
    fn statements_with_responses(&self) -> Result<Vec<Statement>, RiposteError>;

    /// A uniformly random statement from the whole corpus.
    ///
    /// Fails with `RiposteError::EmptyCorpus` when there is none.
    fn random_statement(&self) -> Result<Statement, RiposteError>;

    /// Every recorded reply whose context matches `text` under `mode`.
    fn responses_containing(
        &self,
        text: &str,
        mode: ResponseMatch,
    ) -> Result<Vec<Response>, RiposteError>;

    /// Exact-text lookup.
    fn find(&self, text: &str) -> Result<Option<Statement>, RiposteError>;
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Write-side corpus contract. Not used by the selector.
pub trait CorpusStore: CorpusAccessor {
    /// Store `statement` if new (merging metadata otherwise) and, when
    /// `in_response_to` is given, link it as a reply to that context.
    fn record(
        &mut self,
        statement: &Statement,
        in_response_to: Option<&str>,
    ) -> Result<(), RiposteError>;

    /// Insert or replace a whole record.
    fn insert_record(&mut self, record: StatementRecord) -> Result<(), RiposteError>;

    /// Delete a statement and every link pointing at it.
    fn remove(&mut self, text: &str) -> Result<bool, RiposteError>;

    /// Every record in corpus order.
    fn records(&self) -> Result<Vec<StatementRecord>, RiposteError>;
}

// =============================================================================
// SHARED QUERY HELPERS
// =============================================================================

/// Statements referenced as a context by at least one record, in record order.
pub(crate) fn linked_statements(records: &[StatementRecord]) -> Vec<Statement> {
    let contexts: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.in_response_to.iter().map(|link| link.text.as_str()))
        .collect();

    records
        .iter()
        .filter(|r| contexts.contains(r.text.as_str()))
        .map(StatementRecord::to_statement)
        .collect()
}

/// Replies recorded for contexts matching `text`, in record order.
///
/// A record with several matching links contributes once, carrying the
/// summed occurrence of those links.
pub(crate) fn matching_responses(
    records: &[StatementRecord],
    text: &str,
    mode: ResponseMatch,
) -> Vec<Response> {
    records
        .iter()
        .filter_map(|record| {
            let occurrence = record
                .in_response_to
                .iter()
                .filter(|link| mode.matches(&link.text, text))
                .fold(0u64, |acc, link| acc.saturating_add(link.occurrence));
            (occurrence > 0).then(|| Response::with_occurrence(record.text.clone(), occurrence))
        })
        .collect()
}

// =============================================================================
// METRICS
// =============================================================================

/// Size metrics of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorpusMetrics {
    /// Distinct statements stored.
    pub statement_count: usize,
    /// Statements that have at least one recorded response.
    pub linked_statement_count: usize,
    /// Distinct (reply, context) links.
    pub response_link_count: usize,
    /// Sum of occurrences over all links.
    pub total_occurrences: u64,
}

impl CorpusMetrics {
    /// Compute metrics from any store.
    pub fn from_store(store: &dyn CorpusStore) -> Result<Self, RiposteError> {
        let records = store.records()?;
        Ok(Self::from_records(&records))
    }

    /// Compute metrics from a record list.
    #[must_use]
    pub fn from_records(records: &[StatementRecord]) -> Self {
        let links = records.iter().flat_map(|r| r.in_response_to.iter());
        Self {
            statement_count: records.len(),
            linked_statement_count: linked_statements(records).len(),
            response_link_count: links.clone().count(),
            total_occurrences: links.fold(0u64, |acc, l| acc.saturating_add(l.occurrence)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<StatementRecord> {
        let hello = StatementRecord::new("hello");
        let bye = StatementRecord::new("bye");

        let mut hi = StatementRecord::new("hi");
        for _ in 0..3 {
            hi.link_to("hello");
        }
        let mut hey = StatementRecord::new("hey");
        hey.link_to("hello");
        let mut goodbye = StatementRecord::new("goodbye");
        goodbye.link_to("bye");

        vec![hello, hi, hey, bye, goodbye]
    }

    #[test]
    fn contains_mode_is_substring() {
        assert!(ResponseMatch::Contains.matches("well hello there", "hello"));
        assert!(!ResponseMatch::Exact.matches("well hello there", "hello"));
        assert!(ResponseMatch::Exact.matches("hello", "hello"));
    }

    #[test]
    fn linked_statements_follow_record_order() {
        let linked = linked_statements(&sample_records());
        let texts: Vec<_> = linked.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "bye"]);
    }

    #[test]
    fn matching_responses_carry_occurrence() {
        let responses = matching_responses(&sample_records(), "hello", ResponseMatch::Exact);
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].text, "hi");
        assert_eq!(responses[0].occurrence, 3);
        assert_eq!(responses[1].text, "hey");
        assert_eq!(responses[1].occurrence, 1);
    }

    #[test]
    fn matching_responses_empty_for_unknown_context() {
        assert!(matching_responses(&sample_records(), "xyz", ResponseMatch::Contains).is_empty());
    }

    #[test]
    fn metrics_from_records() {
        let metrics = CorpusMetrics::from_records(&sample_records());
        assert_eq!(metrics.statement_count, 5);
        assert_eq!(metrics.linked_statement_count, 2);
        assert_eq!(metrics.response_link_count, 3);
        assert_eq!(metrics.total_occurrences, 5);
    }

    #[test]
    fn response_match_from_str() {
        assert_eq!(
            "EXACT".parse::<ResponseMatch>().expect("parse"),
            ResponseMatch::Exact
        );
        assert!("fuzzy".parse::<ResponseMatch>().is_err());
    }
}
