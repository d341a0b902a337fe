//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use riposte_core::{CorpusMetrics, ExtraData, Turn};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Corpus status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub statement_count: usize,
    pub linked_statement_count: usize,
    pub response_link_count: usize,
    pub total_occurrences: u64,
    pub persistent: bool,
    pub learn: bool,
}

impl StatusResponse {
    pub fn new(metrics: CorpusMetrics, persistent: bool, learn: bool) -> Self {
        Self {
            statement_count: metrics.statement_count,
            linked_statement_count: metrics.linked_statement_count,
            response_link_count: metrics.response_link_count,
            total_occurrences: metrics.total_occurrences,
            persistent,
            learn,
        }
    }
}

// =============================================================================
// RESPOND REQUEST/RESPONSE
// =============================================================================

/// Ask for a response to `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRequest {
    pub text: String,
    /// Correlation metadata; echoed into storage when learning.
    #[serde(default)]
    pub extra_data: Option<ExtraData>,
    /// Overrides the server's learning setting for this request.
    #[serde(default)]
    pub learn: Option<bool>,
}

/// Chosen response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondResponse {
    pub success: bool,
    pub input: Option<String>,
    pub text: Option<String>,
    pub confidence: Option<f64>,
    /// Confidence reached the "confident" threshold.
    pub confident: bool,
    pub learned: bool,
    pub error: Option<String>,
}

impl RespondResponse {
    pub fn success(turn: Turn) -> Self {
        Self {
            success: true,
            input: Some(turn.input.text),
            confident: turn.response.confidence.is_confident(),
            confidence: Some(turn.response.confidence.value()),
            text: Some(turn.response.text),
            learned: turn.learned,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            input: None,
            text: None,
            confidence: None,
            confident: false,
            learned: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// RECORD REQUEST/RESPONSE
// =============================================================================

/// Record a statement, optionally as a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRequest {
    pub text: String,
    #[serde(default)]
    pub in_response_to: Option<String>,
    #[serde(default)]
    pub extra_data: Option<ExtraData>,
}

/// Record result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    pub statement_count: Option<usize>,
    pub error: Option<String>,
}

impl RecordResponse {
    pub fn success(statement_count: usize) -> Self {
        Self {
            success: true,
            statement_count: Some(statement_count),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            statement_count: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// FORGET REQUEST/RESPONSE
// =============================================================================

/// Remove a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgetRequest {
    pub text: String,
}

/// Forget result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgetResponse {
    pub success: bool,
    pub removed: bool,
    pub error: Option<String>,
}

impl ForgetResponse {
    pub fn success(removed: bool) -> Self {
        Self {
            success: true,
            removed,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            removed: false,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<u64>,
    pub record_count: Option<usize>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: &[u8], checksum: u64, record_count: usize) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                data,
            )),
            checksum: Some(checksum),
            record_count: Some(record_count),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            record_count: None,
            error: Some(msg.into()),
        }
    }
}
