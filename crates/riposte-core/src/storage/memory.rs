//! # In-Memory Corpus
//!
//! A volatile, insertion-ordered corpus.
//!
//! Used by the "file" backend (loaded from and saved to a snapshot) and as
//! the fake collaborator in tests. Iteration order is insertion order, so
//! `statements_with_responses()` is stable for the lifetime of the value.

use crate::corpus::{
    CorpusAccessor, CorpusStore, ResponseMatch, linked_statements, matching_responses,
};
use crate::input;
use crate::types::{Response, RiposteError, Statement, StatementRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// In-memory corpus backend.
#[derive(Debug)]
pub struct MemoryCorpus {
    /// Records in insertion order.
    records: Vec<StatementRecord>,
    /// Text -> position in `records`.
    index: BTreeMap<String, usize>,
    /// Source for `random_statement`.
    rng: Mutex<StdRng>,
}

impl Default for MemoryCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCorpus {
    /// Create an empty corpus with an entropy-seeded RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty corpus whose random picks are reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            records: Vec::new(),
            index: BTreeMap::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Build a corpus from records, keeping their order.
    ///
    /// A later record with the same text replaces the earlier one in place.
    pub fn from_records(records: Vec<StatementRecord>) -> Result<Self, RiposteError> {
        Self::new().with_records(records)
    }

    /// Like `from_records`, with reproducible random picks.
    pub fn from_records_with_seed(
        records: Vec<StatementRecord>,
        seed: u64,
    ) -> Result<Self, RiposteError> {
        Self::with_seed(seed).with_records(records)
    }

    fn with_records(mut self, records: Vec<StatementRecord>) -> Result<Self, RiposteError> {
        for record in records {
            self.insert_record(record)?;
        }
        Ok(self)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.text.clone(), i))
            .collect();
    }
}

impl CorpusAccessor for MemoryCorpus {
    fn count(&self) -> Result<usize, RiposteError> {
        Ok(self.records.len())
    }

    fn statements_with_responses(&self) -> Result<Vec<Statement>, RiposteError> {
        Ok(linked_statements(&self.records))
    }

    fn random_statement(&self) -> Result<Statement, RiposteError> {
        if self.records.is_empty() {
            return Err(RiposteError::EmptyCorpus);
        }
        let pick = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..self.records.len());
        Ok(self.records[pick].to_statement())
    }

    fn responses_containing(
        &self,
        text: &str,
        mode: ResponseMatch,
    ) -> Result<Vec<Response>, RiposteError> {
        Ok(matching_responses(&self.records, text, mode))
    }

    fn find(&self, text: &str) -> Result<Option<Statement>, RiposteError> {
        Ok(self
            .index
            .get(text)
            .map(|&i| self.records[i].to_statement()))
    }
}

impl CorpusStore for MemoryCorpus {
    fn record(
        &mut self,
        statement: &Statement,
        in_response_to: Option<&str>,
    ) -> Result<(), RiposteError> {
        input::validate(statement)?;

        let position = match self.index.get(&statement.text) {
            Some(&i) => i,
            None => {
                self.records.push(StatementRecord::new(statement.text.clone()));
                let i = self.records.len() - 1;
                self.index.insert(statement.text.clone(), i);
                i
            }
        };

        let record = &mut self.records[position];
        record.merge_extra(&statement.extra_data);
        if let Some(context) = in_response_to {
            record.link_to(context);
        }
        Ok(())
    }

    fn insert_record(&mut self, record: StatementRecord) -> Result<(), RiposteError> {
        input::validate(&record.to_statement())?;

        match self.index.get(&record.text) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.text.clone(), self.records.len());
                self.records.push(record);
            }
        }
        Ok(())
    }

    fn remove(&mut self, text: &str) -> Result<bool, RiposteError> {
        let Some(position) = self.index.get(text).copied() else {
            return Ok(false);
        };

        self.records.remove(position);
        for record in &mut self.records {
            record.unlink(text);
        }
        self.reindex();
        Ok(true)
    }

    fn records(&self) -> Result<Vec<StatementRecord>, RiposteError> {
        Ok(self.records.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::with_seed(7);
        corpus.record(&Statement::new("hello"), None).expect("record");
        for _ in 0..3 {
            corpus
                .record(&Statement::new("hi"), Some("hello"))
                .expect("record");
        }
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
    fn count_is_distinct_statements() {
        let corpus = hello_corpus();
        assert_eq!(corpus.count().expect("count"), 5);
    }

    #[test]
    fn duplicate_record_keeps_single_entry() {
        let mut corpus = MemoryCorpus::new();
        corpus.record(&Statement::new("a"), None).expect("record");
        corpus.record(&Statement::new("a"), None).expect("record");
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn statements_with_responses_in_insertion_order() {
        let corpus = hello_corpus();
        let linked = corpus.statements_with_responses().expect("query");
        assert_eq!(linked, vec![Statement::new("hello"), Statement::new("bye")]);
        assert!(linked.iter().all(|s| s.confidence.is_zero()));
    }

    #[test]
    fn responses_containing_reports_occurrence() {
        let corpus = hello_corpus();
        let responses = corpus
            .responses_containing("hello", ResponseMatch::Contains)
            .expect("query");
        assert_eq!(
            responses,
            vec![Response::new("hi"), Response::new("hey")]
        );
        assert_eq!(responses[0].occurrence, 3);
        assert_eq!(responses[1].occurrence, 1);
    }

    #[test]
    fn random_statement_on_empty_corpus_fails() {
        let corpus = MemoryCorpus::new();
        assert!(matches!(
            corpus.random_statement(),
            Err(RiposteError::EmptyCorpus)
        ));
    }

    #[test]
    fn random_statement_comes_from_corpus() {
        let corpus = hello_corpus();
        for _ in 0..20 {
            let s = corpus.random_statement().expect("random");
            assert!(corpus.find(&s.text).expect("find").is_some());
        }
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let a = hello_corpus();
        let b = hello_corpus();
        let picks_a: Vec<_> = (0..10).map(|_| a.random_statement().expect("r").text).collect();
        let picks_b: Vec<_> = (0..10).map(|_| b.random_statement().expect("r").text).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn seeded_from_records_is_reproducible() {
        let records: Vec<_> = (0..30)
            .map(|i| StatementRecord::new(format!("s{}", i)))
            .collect();
        let a = MemoryCorpus::from_records_with_seed(records.clone(), 7).expect("load");
        let b = MemoryCorpus::from_records_with_seed(records, 7).expect("load");
        let picks_a: Vec<_> = (0..10).map(|_| a.random_statement().expect("r").text).collect();
        let picks_b: Vec<_> = (0..10).map(|_| b.random_statement().expect("r").text).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn remove_drops_record_and_links() {
        let mut corpus = hello_corpus();
        assert!(corpus.remove("hello").expect("remove"));
        assert!(!corpus.remove("hello").expect("remove"));

        assert!(corpus.find("hello").expect("find").is_none());
        assert!(
            corpus
                .responses_containing("hello", ResponseMatch::Exact)
                .expect("query")
                .is_empty()
        );
        // Index still consistent after the shift.
        assert_eq!(
            corpus.find("goodbye").expect("find"),
            Some(Statement::new("goodbye"))
        );
    }

    #[test]
    fn insert_record_replaces_in_place() {
        let mut corpus = hello_corpus();
        let mut replacement = StatementRecord::new("hi");
        replacement.link_to("bye");
        corpus.insert_record(replacement).expect("insert");

        let records = corpus.records().expect("records");
        assert_eq!(records[1].text, "hi");
        assert_eq!(records[1].in_response_to, vec![Response::new("bye")]);
    }
}
