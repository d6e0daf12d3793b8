//! Configuration loading: TOML parsing and the content-hash cache

pub mod cache;
pub mod schema;

pub use cache::ConfigCache;

use crate::core::config::CastingConfig;
use crate::core::error::{CastError, Result};
use schema::TomlCastingFile;
use std::path::Path;

/// Hex BLAKE3 digest used as the content identity of a config source
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Parse and validate a configuration document
///
/// `path` is only used for error reporting.
pub fn parse_config(content: &str, path: &Path, source_hash: String) -> Result<CastingConfig> {
    let file: TomlCastingFile = toml::from_str(content).map_err(|e| CastError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    file.into_config(source_hash)
        .map_err(CastError::ConfigValidation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_path() {
        let err = parse_config("[casting", Path::new("casting.toml"), String::new()).unwrap_err();
        assert!(matches!(err, CastError::ConfigParse { .. }));
        assert!(err.to_string().contains("casting.toml"));
    }

    #[test]
    fn test_validation_error_is_distinct() {
        let err = parse_config(
            "[casting]\ntimeout_ms = 0",
            Path::new("casting.toml"),
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CastError::ConfigValidation(_)));
    }

    #[test]
    fn test_content_hash_is_stable() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
        assert_eq!(content_hash(b"").len(), 64);
    }
}
