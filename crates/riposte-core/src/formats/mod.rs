//! # Formats Module
//!
//! Serialization formats for Riposte corpora.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, corpus_from_bytes, corpus_to_bytes,
    snapshot_checksum,
};
