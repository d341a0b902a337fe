//! # riposte-core
//!
//! The response selection engine for Riposte - THE LOGIC.
//!
//! Given an input statement and a corpus of previously recorded
//! conversations, pick the known statement closest to the input and answer
//! with one of the replies recorded for it.
//!
//! ## Pipeline
//!
//! - `input`: resolve raw text against the corpus
//! - `logic`: score candidates (`BestMatch`, `SpecificResponse`) and keep the
//!   most confident answer (`LogicChain`)
//! - `session`: one step of conversation memory and optional learning
//!
//! ## Architectural Constraints
//!
//! - Pure synchronous Rust: NO async, NO network dependencies
//! - No process-wide state: corpus, configuration and RNG are passed in
//! - Storage is reached only through `CorpusAccessor` / `CorpusStore`

// =============================================================================
// MODULES
// =============================================================================

pub mod comparator;
pub mod confidence;
pub mod config;
pub mod corpus;
pub mod formats;
pub mod input;
pub mod logic;
pub mod primitives;
pub mod session;
pub mod storage;
pub mod tiebreak;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ExtraData, Response, RiposteError, Statement, StatementRecord};

// =============================================================================
// RE-EXPORTS: Selection Engine
// =============================================================================

pub use comparator::{Comparator, ComparatorKind, ExactMatch, JaccardSimilarity, LevenshteinDistance};
pub use confidence::Confidence;
pub use config::{ResponderConfig, SpecificResponseConfig};
pub use corpus::{CorpusAccessor, CorpusMetrics, CorpusStore, ResponseMatch};
pub use input::resolve_input;
pub use logic::{BestMatch, LogicAdapter, LogicChain, SpecificResponse};
pub use session::{Session, StorageBackend, Turn};
pub use storage::{MemoryCorpus, RedbCorpus};
pub use tiebreak::{First, MostFrequent, OccurrenceWeighted, TieBreak, TieBreakKind, UniformRandom};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, corpus_from_bytes, corpus_to_bytes, snapshot_checksum};
