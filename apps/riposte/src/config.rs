//! # Configuration Loading
//!
//! Reads `ResponderConfig` from a TOML file.
//!
//! ```toml
//! comparator = "levenshtein"   # levenshtein | jaccard | exact
//! tie_break = "uniform"        # uniform | weighted | first | most_frequent
//! response_match = "contains"  # contains | exact
//! learn = true
//!
//! [[specific_responses]]
//! input = "ping"
//! output = "pong"
//! ```
//!
//! Missing keys take their defaults; unknown keys or names are rejected.

use riposte_core::{ResponderConfig, RiposteError};
use std::path::Path;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Parse a configuration from TOML text.
pub fn parse_config(text: &str) -> Result<ResponderConfig, RiposteError> {
    let config: ResponderConfig =
        toml::from_str(text).map_err(|e| RiposteError::InvalidConfig(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ResponderConfig, RiposteError> {
    let Some(path) = path else {
        return Ok(ResponderConfig::default());
    };

    let metadata = std::fs::metadata(path).map_err(|e| {
        RiposteError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(RiposteError::InvalidConfig(format!(
            "Config file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| RiposteError::IoError(format!("Read config: {}", e)))?;
    let config = parse_config(&text)?;

    tracing::info!(
        path = %path.display(),
        comparator = ?config.comparator,
        tie_break = ?config.tie_break,
        response_match = ?config.response_match,
        learn = config.learn,
        "Loaded responder configuration"
    );
    Ok(config)
}

// =============================================================================
// TESTS
// =============================================================================
