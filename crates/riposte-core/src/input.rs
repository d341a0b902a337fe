//! # Input Module
//!
//! Statement validation and input resolution.
//!
//! - Validate statements before they reach storage
//! - Reject oversized input
//! - Resolve an incoming text to its stored statement when one exists
//!
//! Empty text is valid: it is a degenerate input, not a malformed one.

use crate::corpus::CorpusAccessor;
use crate::primitives::{MAX_EXTRA_DATA_ENTRIES, MAX_EXTRA_KEY_LENGTH, MAX_TEXT_LENGTH};
use crate::types::{ExtraData, RiposteError, Statement};

/// Validate a statement against the input limits.
pub fn validate(statement: &Statement) -> Result<(), RiposteError> {
    if statement.text.len() > MAX_TEXT_LENGTH {
        return Err(RiposteError::InvalidStatement(format!(
            "Text length {} exceeds maximum {} bytes",
            statement.text.len(),
            MAX_TEXT_LENGTH
        )));
    }

    if statement.extra_data.len() > MAX_EXTRA_DATA_ENTRIES {
        return Err(RiposteError::InvalidStatement(format!(
            "{} extra_data entries exceed maximum {}",
            statement.extra_data.len(),
            MAX_EXTRA_DATA_ENTRIES
        )));
    }

    if let Some(key) = statement
        .extra_data
        .keys()
        .find(|k| k.is_empty() || k.len() > MAX_EXTRA_KEY_LENGTH)
    {
        return Err(RiposteError::InvalidStatement(format!(
            "Invalid extra_data key of length {}",
            key.len()
        )));
    }

    Ok(())
}

/// Turn raw input text into the statement the pipeline should work with.
///
/// If the corpus already knows `text`, the stored statement is used (with
/// `extra_data` from the caller merged on top). Otherwise a fresh statement
/// is built.
pub fn resolve_input(
    corpus: &dyn CorpusAccessor,
    text: &str,
    extra_data: ExtraData,
) -> Result<Statement, RiposteError> {
    let fresh = Statement::new(text).with_extra_data(extra_data);
    validate(&fresh)?;

    tracing::info!(input = %text, "Received input statement");

    match corpus.find(text)? {
        Some(mut existing) => {
            tracing::info!(input = %text, "Input is a known statement");
            for (key, value) in fresh.extra_data {
                existing.extra_data.insert(key, value);
            }
            Ok(existing)
        }
        None => {
            tracing::info!(input = %text, "Input is not a known statement");
            Ok(fresh)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
