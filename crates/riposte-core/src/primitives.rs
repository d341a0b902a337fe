//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Riposte CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Magic bytes for the Riposte snapshot format header.
///
/// - File Header = Magic Bytes ("RIPO") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"RIPO";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

/// Confidence at or above which a match is reported as "confident".
///
/// The selector never filters on this value; it is exposed for callers
/// that want to label answers (the HTTP API and the CLI do).
pub const CONFIDENT_THRESHOLD: f64 = 0.7;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for statement text, in bytes.
///
/// Longer statements are rejected before they reach storage.
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Characters of each text considered by the edit-distance comparator.
///
/// Edit distance is quadratic in text length; statements longer than this
/// are compared on their leading characters only.
pub const MAX_COMPARE_CHARS: usize = 1024;

/// Maximum number of `extra_data` entries on a single statement.
pub const MAX_EXTRA_DATA_ENTRIES: usize = 64;

/// Maximum length for an `extra_data` key, in bytes.
pub const MAX_EXTRA_KEY_LENGTH: usize = 256;

/// Maximum number of records a snapshot may carry.
pub const MAX_SNAPSHOT_RECORDS: usize = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"RIPO");
    }

    #[test]
    fn compare_window_fits_in_text_limit() {
        assert!(MAX_COMPARE_CHARS <= MAX_TEXT_LENGTH);
    }

    #[test]
    fn confident_threshold_is_a_probability() {
        assert!((0.0..=1.0).contains(&CONFIDENT_THRESHOLD));
    }
}
