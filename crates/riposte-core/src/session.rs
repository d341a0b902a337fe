//! # Session Module
//!
//! Session management combining a corpus backend with one step of
//! conversation memory.
//!
//! - The last response given is remembered, never persisted
//! - When learning is on, each input is recorded as a reply to that response
//! - Cleared on session reset
//!
//! ## Storage Backends
//!
//! Session supports two storage backends:
//! - `InMemory`: Uses `MemoryCorpus` (fast, volatile unless explicitly saved)
//! - `Persistent`: Uses `RedbCorpus` for disk-backed ACID storage

use crate::corpus::{CorpusAccessor, CorpusMetrics, CorpusStore};
use crate::input;
use crate::logic::LogicChain;
use crate::storage::{MemoryCorpus, RedbCorpus};
use crate::types::{ExtraData, RiposteError, Statement, StatementRecord};
use rand::RngCore;
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory corpus (fast, volatile).
    InMemory(MemoryCorpus),
    /// Disk-backed corpus using redb (ACID, persistent).
    Persistent(RedbCorpus),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryCorpus::new())
    }
}

impl StorageBackend {
    /// Read side of the backend.
    #[must_use]
    pub fn accessor(&self) -> &dyn CorpusAccessor {
        match self {
            Self::InMemory(corpus) => corpus,
            Self::Persistent(corpus) => corpus,
        }
    }

    /// Full store of the backend.
    #[must_use]
    pub fn store(&self) -> &dyn CorpusStore {
        match self {
            Self::InMemory(corpus) => corpus,
            Self::Persistent(corpus) => corpus,
        }
    }

    /// Mutable store of the backend.
    pub fn store_mut(&mut self) -> &mut dyn CorpusStore {
        match self {
            Self::InMemory(corpus) => corpus,
            Self::Persistent(corpus) => corpus,
        }
    }
}

/// Result of one conversational turn.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The input as resolved against the corpus.
    pub input: Statement,
    /// The chosen response, confidence set.
    pub response: Statement,
    /// Whether the input was recorded into the corpus.
    pub learned: bool,
}

/// A Session combines a corpus backend with the previous response.
///
/// Note: Session does NOT implement Clone; the redb handle cannot be cloned.
#[derive(Debug, Default)]
pub struct Session {
    /// The storage backend (in-memory or persistent).
    backend: StorageBackend,
    /// Text of the last response given, if any.
    last_response: Option<String>,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with an existing in-memory corpus.
    #[must_use]
    pub fn with_memory(corpus: MemoryCorpus) -> Self {
        Self {
            backend: StorageBackend::InMemory(corpus),
            last_response: None,
        }
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    /// All changes are automatically persisted to disk.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, RiposteError> {
        let redb = RedbCorpus::open(path)?;
        Ok(Self::with_redb_corpus(redb))
    }

    /// Create a session with a redb backend whose random picks are reproducible.
    pub fn with_redb_seed(path: impl AsRef<Path>, seed: u64) -> Result<Self, RiposteError> {
        let redb = RedbCorpus::open_with_seed(path, seed)?;
        Ok(Self::with_redb_corpus(redb))
    }

    /// Create a session with an existing `RedbCorpus`.
    #[must_use]
    pub fn with_redb_corpus(redb: RedbCorpus) -> Self {
        Self {
            backend: StorageBackend::Persistent(redb),
            last_response: None,
        }
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Get the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Read-only corpus view handed to logic adapters.
    #[must_use]
    pub fn corpus(&self) -> &dyn CorpusAccessor {
        self.backend.accessor()
    }

    /// Text of the previous response, if any.
    #[must_use]
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    /// Forget the previous response.
    pub fn clear_conversation(&mut self) {
        self.last_response = None;
    }

    // =========================================================================
    // CONVERSATION
    // =========================================================================

    /// Answer `text`.
    ///
    /// The input is resolved against the corpus, handed to `chain`, and, when
    /// `learn` is set, recorded as a reply to the previous response. The
    /// learning write happens after selection, so it never influences the
    /// answer to the same input.
    pub fn respond(
        &mut self,
        chain: &LogicChain,
        text: &str,
        extra_data: ExtraData,
        learn: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Turn, RiposteError> {
        let input = input::resolve_input(self.corpus(), text, extra_data)?;
        let response = chain.process(self.corpus(), &input, rng)?;

        if learn {
            let previous = self.last_response.take();
            self.backend
                .store_mut()
                .record(&input, previous.as_deref())?;
            tracing::debug!(
                input = %input.text,
                in_response_to = ?previous,
                "Learned input"
            );
        }

        self.last_response = Some(response.text.clone());

        Ok(Turn {
            input,
            response,
            learned: learn,
        })
    }

    // =========================================================================
    // CORPUS MAINTENANCE
    // =========================================================================

    /// Record a statement, optionally as a reply to another.
    pub fn record(
        &mut self,
        statement: &Statement,
        in_response_to: Option<&str>,
    ) -> Result<(), RiposteError> {
        self.backend.store_mut().record(statement, in_response_to)
    }

    /// Record a whole conversation: each line replies to the one before.
    pub fn record_conversation<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), RiposteError> {
        let mut previous: Option<&str> = None;
        for line in lines {
            let line = line.as_ref();
            self.record(&Statement::new(line), previous)?;
            previous = Some(line);
        }
        Ok(())
    }

    /// Remove a statement and every link to it.
    pub fn forget(&mut self, text: &str) -> Result<bool, RiposteError> {
        let removed = self.backend.store_mut().remove(text)?;
        if removed && self.last_response.as_deref() == Some(text) {
            self.last_response = None;
        }
        Ok(removed)
    }

    /// Number of distinct statements.
    pub fn statement_count(&self) -> Result<usize, RiposteError> {
        self.corpus().count()
    }

    /// Size metrics of the corpus.
    pub fn metrics(&self) -> Result<CorpusMetrics, RiposteError> {
        CorpusMetrics::from_store(self.backend.store())
    }

    /// Every record in corpus order, for snapshots.
    pub fn export_records(&self) -> Result<Vec<StatementRecord>, RiposteError> {
        self.backend.store().records()
    }

    /// Insert or replace records; returns how many were written.
    pub fn import_records(&mut self, records: Vec<StatementRecord>) -> Result<usize, RiposteError> {
        let count = records.len();
        let store = self.backend.store_mut();
        for record in records {
            store.insert_record(record)?;
        }
        Ok(count)
    }
}

// =============================================================================
// TESTS
// =============================================================================
