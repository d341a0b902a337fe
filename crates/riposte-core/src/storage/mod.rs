//! # Storage Module
//!
//! Corpus backends. The matching core only sees them through
//! `CorpusAccessor`; the application picks one at startup.

pub mod memory;
pub mod redb_corpus;

pub use memory::MemoryCorpus;
pub use redb_corpus::RedbCorpus;
