//! # Persistence Format
//!
//! Binary serialization for Riposte corpora.
//!
//! File I/O operations are in the app layer; this module is pure.
//!
//! Format: Header (5 bytes) + postcard-serialized record list.
//! - 4 bytes: Magic ("RIPO")
//! - 1 byte: Version
//!
//! postcard is not self-describing, so `extra_data` (arbitrary JSON) is
//! carried as an embedded JSON string inside each packed record.
//!
//! ## Validation
//!
//! Size and header checks run before any payload is decoded.

use crate::primitives::{self, MAX_SNAPSHOT_RECORDS};
use crate::types::{ExtraData, Response, RiposteError, StatementRecord};
use serde::{Deserialize, Serialize};

/// Maximum allowed payload size for the snapshot format (500 MB).
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024;

/// Minimum valid file size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all corpus data.
#[derive(Debug, Clone, Copy)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), RiposteError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(RiposteError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(RiposteError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RiposteError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(RiposteError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PACKED RECORD
// =============================================================================

/// postcard-friendly form of a `StatementRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PackedRecord {
    text: String,
    extra_data_json: String,
    in_response_to: Vec<Response>,
}

impl TryFrom<&StatementRecord> for PackedRecord {
    type Error = RiposteError;

    fn try_from(record: &StatementRecord) -> Result<Self, Self::Error> {
        let extra_data_json = if record.extra_data.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&record.extra_data)
                .map_err(|e| RiposteError::SerializationError(e.to_string()))?
        };
        Ok(Self {
            text: record.text.clone(),
            extra_data_json,
            in_response_to: record.in_response_to.clone(),
        })
    }
}

impl TryFrom<PackedRecord> for StatementRecord {
    type Error = RiposteError;

    fn try_from(packed: PackedRecord) -> Result<Self, Self::Error> {
        let extra_data = if packed.extra_data_json.is_empty() {
            ExtraData::new()
        } else {
            serde_json::from_str(&packed.extra_data_json)
                .map_err(|e| RiposteError::DeserializationError(e.to_string()))?
        };
        Ok(Self {
            text: packed.text,
            extra_data,
            in_response_to: packed.in_response_to,
        })
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a record list to bytes (header + payload).
pub fn corpus_to_bytes(records: &[StatementRecord]) -> Result<Vec<u8>, RiposteError> {
    if records.len() > MAX_SNAPSHOT_RECORDS {
        return Err(RiposteError::SerializationError(format!(
            "Record count {} exceeds maximum {}",
            records.len(),
            MAX_SNAPSHOT_RECORDS
        )));
    }

    let packed = records
        .iter()
        .map(PackedRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let payload = postcard::to_stdvec(&packed)
        .map_err(|e| RiposteError::SerializationError(e.to_string()))?;

    let header = PersistenceHeader::new();
    let mut result = Vec::with_capacity(MIN_FILE_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a record list from bytes.
///
/// Validates, in order: minimum size, maximum size, header magic and
/// version, then decodes the payload.
pub fn corpus_from_bytes(bytes: &[u8]) -> Result<Vec<StatementRecord>, RiposteError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(RiposteError::DeserializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }

    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(RiposteError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let packed: Vec<PackedRecord> = postcard::from_bytes(&bytes[MIN_FILE_SIZE..])
        .map_err(|e| {
            RiposteError::DeserializationError(format!("Failed to decode corpus data: {}", e))
        })?;

    if packed.len() > MAX_SNAPSHOT_RECORDS {
        return Err(RiposteError::DeserializationError(format!(
            "Record count {} exceeds maximum {}",
            packed.len(),
            MAX_SNAPSHOT_RECORDS
        )));
    }

    packed.into_iter().map(StatementRecord::try_from).collect()
}

/// FNV-1a checksum over snapshot bytes.
///
/// For integrity checks only; not collision resistant.
#[must_use]
pub fn snapshot_checksum(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    bytes.iter().fold(OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(PRIME)
    })
}

// =============================================================================
// TESTS
// =============================================================================
