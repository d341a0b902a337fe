//! # redb-backed Corpus Storage
//!
//! A disk-backed corpus using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are keyed by an insertion sequence number, so a table scan yields
//! corpus order. A text index maps statement text to its sequence number and
//! is mirrored in memory for O(1) `count()` and fast `find()`.

use crate::corpus::{
    CorpusAccessor, CorpusStore, ResponseMatch, linked_statements, matching_responses,
};
use crate::formats::persistence::PackedRecord;
use crate::input;
use crate::types::{Response, RiposteError, Statement, StatementRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Table for records: sequence(u64) -> packed record bytes
const RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("records");

/// Table for the text index: statement text -> sequence(u64)
const TEXT_INDEX: TableDefinition<&str, u64> = TableDefinition::new("text_index");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

fn encode(record: &StatementRecord) -> Result<Vec<u8>, RiposteError> {
    let packed = PackedRecord::try_from(record)?;
    postcard::to_allocvec(&packed).map_err(|e| RiposteError::SerializationError(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<StatementRecord, RiposteError> {
    let packed: PackedRecord = postcard::from_bytes(bytes)
        .map_err(|e| RiposteError::DeserializationError(e.to_string()))?;
    StatementRecord::try_from(packed)
}

/// A disk-backed corpus store using redb.
pub struct RedbCorpus {
    /// The redb database handle.
    db: Database,
    /// In-memory mirror of the text index.
    text_cache: BTreeMap<String, u64>,
    /// Next sequence number to assign.
    next_seq: u64,
    /// Source for `random_statement`.
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for RedbCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCorpus")
            .field("statement_count", &self.text_cache.len())
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl RedbCorpus {
    /// Open or create a corpus database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RiposteError> {
        Self::open_with_rng(path, StdRng::from_entropy())
    }

    /// Open or create a corpus whose random picks are reproducible.
    pub fn open_with_seed(path: impl AsRef<Path>, seed: u64) -> Result<Self, RiposteError> {
        Self::open_with_rng(path, StdRng::seed_from_u64(seed))
    }

    fn open_with_rng(path: impl AsRef<Path>, rng: StdRng) -> Result<Self, RiposteError> {
        let db = Database::create(path.as_ref()).map_err(RiposteError::accessor)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(RiposteError::accessor)?;
            let _ = write_txn
                .open_table(RECORDS)
                .map_err(RiposteError::accessor)?;
            let _ = write_txn
                .open_table(TEXT_INDEX)
                .map_err(RiposteError::accessor)?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(RiposteError::accessor)?;
            write_txn.commit().map_err(RiposteError::accessor)?;
        }

        let read_txn = db.begin_read().map_err(RiposteError::accessor)?;

        let next_seq = {
            let table = read_txn
                .open_table(METADATA)
                .map_err(RiposteError::accessor)?;
            table
                .get("next_seq")
                .map_err(RiposteError::accessor)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        let text_cache = {
            let table = read_txn
                .open_table(TEXT_INDEX)
                .map_err(RiposteError::accessor)?;
            let mut cache = BTreeMap::new();
            for entry in table.iter().map_err(RiposteError::accessor)? {
                let (key, value) = entry.map_err(RiposteError::accessor)?;
                cache.insert(key.value().to_string(), value.value());
            }
            cache
        };

        Ok(Self {
            db,
            text_cache,
            next_seq,
            rng: Mutex::new(rng),
        })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), RiposteError> {
        self.db.compact().map_err(RiposteError::accessor)?;
        Ok(())
    }

    fn load(&self, seq: u64) -> Result<Option<StatementRecord>, RiposteError> {
        let read_txn = self.db.begin_read().map_err(RiposteError::accessor)?;
        let table = read_txn
            .open_table(RECORDS)
            .map_err(RiposteError::accessor)?;
        match table.get(seq).map_err(RiposteError::accessor)? {
            Some(data) => Ok(Some(decode(data.value())?)),
            None => Ok(None),
        }
    }

    /// Write `record` under its existing sequence number, or a new one.
    fn store(&mut self, record: &StatementRecord) -> Result<(), RiposteError> {
        let bytes = encode(record)?;
        let existing = self.text_cache.get(&record.text).copied();
        let seq = existing.unwrap_or(self.next_seq);
        let next_seq = if existing.is_some() {
            self.next_seq
        } else {
            self.next_seq.saturating_add(1)
        };

        let write_txn = self.db.begin_write().map_err(RiposteError::accessor)?;
        {
            let mut records = write_txn
                .open_table(RECORDS)
                .map_err(RiposteError::accessor)?;
            records
                .insert(seq, bytes.as_slice())
                .map_err(RiposteError::accessor)?;

            let mut index = write_txn
                .open_table(TEXT_INDEX)
                .map_err(RiposteError::accessor)?;
            index
                .insert(record.text.as_str(), seq)
                .map_err(RiposteError::accessor)?;

            let mut meta = write_txn
                .open_table(METADATA)
                .map_err(RiposteError::accessor)?;
            meta.insert("next_seq", next_seq)
                .map_err(RiposteError::accessor)?;
        }
        write_txn.commit().map_err(RiposteError::accessor)?;

        // Update in-memory state only after successful commit.
        self.text_cache.insert(record.text.clone(), seq);
        self.next_seq = next_seq;
        Ok(())
    }
}

// =============================================================================
// ACCESSOR IMPLEMENTATION
// =============================================================================

impl CorpusAccessor for RedbCorpus {
    fn count(&self) -> Result<usize, RiposteError> {
        Ok(self.text_cache.len())
    }

    fn statements_with_responses(&self) -> Result<Vec<Statement>, RiposteError> {
        Ok(linked_statements(&self.records()?))
    }

    fn random_statement(&self) -> Result<Statement, RiposteError> {
        if self.text_cache.is_empty() {
            return Err(RiposteError::EmptyCorpus);
        }
        let pick = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..self.text_cache.len());

        let read_txn = self.db.begin_read().map_err(RiposteError::accessor)?;
        let table = read_txn
            .open_table(RECORDS)
            .map_err(RiposteError::accessor)?;
        let entry = table
            .iter()
            .map_err(RiposteError::accessor)?
            .nth(pick)
            .ok_or_else(|| RiposteError::AccessorUnavailable("record index out of sync".into()))?;
        let (_, value) = entry.map_err(RiposteError::accessor)?;
        Ok(decode(value.value())?.to_statement())
    }

    fn responses_containing(
        &self,
        text: &str,
        mode: ResponseMatch,
    ) -> Result<Vec<Response>, RiposteError> {
        Ok(matching_responses(&self.records()?, text, mode))
    }

    fn find(&self, text: &str) -> Result<Option<Statement>, RiposteError> {
        let Some(&seq) = self.text_cache.get(text) else {
            return Ok(None);
        };
        Ok(self.load(seq)?.map(|r| r.to_statement()))
    }
}

// =============================================================================
// STORE IMPLEMENTATION
// =============================================================================

impl CorpusStore for RedbCorpus {
    fn record(
        &mut self,
        statement: &Statement,
        in_response_to: Option<&str>,
    ) -> Result<(), RiposteError> {
        input::validate(statement)?;

        let mut record = match self.text_cache.get(&statement.text) {
            Some(&seq) => self
                .load(seq)?
                .unwrap_or_else(|| StatementRecord::new(statement.text.clone())),
            None => StatementRecord::new(statement.text.clone()),
        };
        record.merge_extra(&statement.extra_data);
        if let Some(context) = in_response_to {
            record.link_to(context);
        }
        self.store(&record)
    }

    fn insert_record(&mut self, record: StatementRecord) -> Result<(), RiposteError> {
        input::validate(&record.to_statement())?;
        self.store(&record)
    }

    fn remove(&mut self, text: &str) -> Result<bool, RiposteError> {
        let Some(&seq) = self.text_cache.get(text) else {
            return Ok(false);
        };

        let write_txn = self.db.begin_write().map_err(RiposteError::accessor)?;
        {
            let mut records = write_txn
                .open_table(RECORDS)
                .map_err(RiposteError::accessor)?;
            records.remove(seq).map_err(RiposteError::accessor)?;

            // Collect rows still linking to the removed text, then rewrite them.
            let mut relinked = Vec::new();
            for entry in records.iter().map_err(RiposteError::accessor)? {
                let (key, value) = entry.map_err(RiposteError::accessor)?;
                let mut record = decode(value.value())?;
                if record.unlink(text) {
                    relinked.push((key.value(), encode(&record)?));
                }
            }
            for (key, bytes) in relinked {
                records
                    .insert(key, bytes.as_slice())
                    .map_err(RiposteError::accessor)?;
            }

            let mut index = write_txn
                .open_table(TEXT_INDEX)
                .map_err(RiposteError::accessor)?;
            index.remove(text).map_err(RiposteError::accessor)?;
        }
        write_txn.commit().map_err(RiposteError::accessor)?;

        self.text_cache.remove(text);
        Ok(true)
    }

    fn records(&self) -> Result<Vec<StatementRecord>, RiposteError> {
        let read_txn = self.db.begin_read().map_err(RiposteError::accessor)?;
        let table = read_txn
            .open_table(RECORDS)
            .map_err(RiposteError::accessor)?;

        let mut records = Vec::with_capacity(self.text_cache.len());
        for entry in table.iter().map_err(RiposteError::accessor)? {
            let (_, value) = entry.map_err(RiposteError::accessor)?;
            records.push(decode(value.value())?);
        }
        Ok(records)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed(corpus: &mut RedbCorpus) {
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
    }

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut corpus = RedbCorpus::open(temp.path().join("test.redb")).expect("open db");
        seed(&mut corpus);

        assert_eq!(corpus.count().expect("count"), 5);
        assert_eq!(
            corpus.statements_with_responses().expect("query"),
            vec![Statement::new("hello"), Statement::new("bye")]
        );

        let responses = corpus
            .responses_containing("hello", ResponseMatch::Exact)
            .expect("query");
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].text, "hi");
        assert_eq!(responses[0].occurrence, 3);
    }

    #[test]
    fn persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut corpus = RedbCorpus::open(&db_path).expect("open db");
            seed(&mut corpus);
        }

        {
            let mut corpus = RedbCorpus::open(&db_path).expect("reopen db");
            assert_eq!(corpus.count().expect("count"), 5);
            assert!(corpus.find("goodbye").expect("find").is_some());

            // Sequence numbers continue after reopen.
            corpus.record(&Statement::new("later"), None).expect("record");
            let records = corpus.records().expect("records");
            assert_eq!(records.last().map(|r| r.text.as_str()), Some("later"));
        }
    }

    #[test]
    fn extra_data_survives_storage() {
        let temp = tempdir().expect("temp dir");
        let mut corpus = RedbCorpus::open(temp.path().join("test.redb")).expect("open db");
        let s = Statement::new("hello").with_extra("message_id", serde_json::json!({"id": 42}));
        corpus.record(&s, None).expect("record");

        let found = corpus.find("hello").expect("find").expect("present");
        assert_eq!(found.extra_data["message_id"], serde_json::json!({"id": 42}));
    }

    #[test]
    fn random_statement_empty_and_populated() {
        let temp = tempdir().expect("temp dir");
        let mut corpus = RedbCorpus::open(temp.path().join("test.redb")).expect("open db");
        assert!(matches!(
            corpus.random_statement(),
            Err(RiposteError::EmptyCorpus)
        ));

        seed(&mut corpus);
        let pick = corpus.random_statement().expect("random");
        assert!(corpus.find(&pick.text).expect("find").is_some());
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        {
            let mut corpus = RedbCorpus::open(&db_path).expect("open db");
            for i in 0..30 {
                corpus
                    .record(&Statement::new(format!("s{}", i)), None)
                    .expect("record");
            }
        }

        let picks = || {
            let corpus = RedbCorpus::open_with_seed(&db_path, 7).expect("open db");
            (0..10)
                .map(|_| corpus.random_statement().expect("random").text)
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(), picks());
    }

    #[test]
    fn remove_unlinks_dependents() {
        let temp = tempdir().expect("temp dir");
        let mut corpus = RedbCorpus::open(temp.path().join("test.redb")).expect("open db");
        seed(&mut corpus);

        assert!(corpus.remove("bye").expect("remove"));
        assert!(!corpus.remove("bye").expect("remove"));
        assert_eq!(corpus.count().expect("count"), 4);
        assert_eq!(
            corpus.statements_with_responses().expect("query"),
            vec![Statement::new("hello")]
        );
    }

    #[test]
    fn compact_and_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut corpus = RedbCorpus::open(&db_path).expect("open db");
            seed(&mut corpus);
            corpus.remove("hey").expect("remove");
            corpus.compact().expect("compact");
        }

        let corpus = RedbCorpus::open(&db_path).expect("reopen db");
        assert_eq!(corpus.count().expect("count"), 4);
        assert!(corpus.find("hey").expect("find").is_none());
    }

    #[test]
    fn insert_record_keeps_position() {
        let temp = tempdir().expect("temp dir");
        let mut corpus = RedbCorpus::open(temp.path().join("test.redb")).expect("open db");
        seed(&mut corpus);

        corpus
            .insert_record(StatementRecord::new("hi"))
            .expect("insert");
        let records = corpus.records().expect("records");
        assert_eq!(records[1].text, "hi");
        assert!(records[1].in_response_to.is_empty());
        assert_eq!(records.len(), 5);
    }
}
