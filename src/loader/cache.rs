//! Content-hash configuration cache
//!
//! Holds the active `CastingConfig` as an `Arc` snapshot. A load whose
//! source digest matches the last successful parse returns the cached
//! snapshot without reparsing. A failed load never replaces the snapshot.

use crate::core::config::CastingConfig;
use crate::core::error::{CastError, Result};
use crate::loader::{content_hash, parse_config};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Source {
    path: PathBuf,
    hash: String,
}

#[derive(Debug)]
pub struct ConfigCache {
    current: RwLock<Arc<CastingConfig>>,
    /// Last successfully parsed source; also serializes loads
    source: Mutex<Option<Source>>,
    parse_count: AtomicU64,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::with_config(CastingConfig::default())
    }
}

impl ConfigCache {
    /// Cache serving built-in defaults until the first load
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CastingConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
            source: Mutex::new(None),
            parse_count: AtomicU64::new(0),
        }
    }

    /// Current snapshot
    pub fn current(&self) -> Arc<CastingConfig> {
        self.current.read().clone()
    }

    /// Load `path`, reparsing only if its content changed
    pub fn load(&self, path: &Path) -> Result<Arc<CastingConfig>> {
        self.load_inner(path, false)
    }

    /// Reparse the last loaded source unconditionally
    pub fn force_reload(&self) -> Result<Arc<CastingConfig>> {
        let path = self
            .source
            .lock()
            .as_ref()
            .map(|s| s.path.clone())
            .ok_or(CastError::NoConfigSource)?;
        self.load_inner(&path, true)
    }

    /// Number of parses performed, successful or not
    pub fn parse_count(&self) -> u64 {
        self.parse_count.load(Ordering::Relaxed)
    }

    fn load_inner(&self, path: &Path, force: bool) -> Result<Arc<CastingConfig>> {
        let mut source = self.source.lock();

        let bytes = std::fs::read(path).map_err(|e| {
            tracing::error!("Cannot read casting config {:?}: {}", path, e);
            CastError::ConfigIo {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        let hash = content_hash(&bytes);

        let unchanged = source
            .as_ref()
            .is_some_and(|s| s.path == path && s.hash == hash);
        if unchanged && !force {
            tracing::debug!("Casting config {:?} unchanged, using cached copy", path);
            return Ok(self.current());
        }

        self.parse_count.fetch_add(1, Ordering::Relaxed);
        let parsed = std::str::from_utf8(&bytes)
            .map_err(|e| CastError::ConfigParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
            .and_then(|content| parse_config(content, path, hash.clone()));

        match parsed {
            Ok(config) => {
                let config = Arc::new(config);
                *self.current.write() = config.clone();
                *source = Some(Source {
                    path: path.to_path_buf(),
                    hash,
                });
                tracing::info!(
                    "Loaded casting config {:?} ({} classes)",
                    path,
                    config.profiles.len()
                );
                Ok(config)
            }
            Err(e) => {
                tracing::error!("Rejected casting config {:?}, keeping previous: {}", path, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    const GOOD: &str = r#"
[casting]
timeout_ms = 4000

[profiles.mage.LRL]
skill = "fireball"
min_level = 5
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn rewrite(file: &NamedTempFile, content: &str) {
        std::fs::write(file.path(), content).unwrap();
    }

    #[test]
    fn test_unchanged_source_parses_once() {
        let file = write_config(GOOD);
        let cache = ConfigCache::new();

        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();

        assert_eq!(cache.parse_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.timeout, Duration::from_millis(4000));
        assert_eq!(first.source_hash, content_hash(GOOD.as_bytes()));
    }

    #[test]
    fn test_changed_source_is_reparsed() {
        let file = write_config(GOOD);
        let cache = ConfigCache::new();
        cache.load(file.path()).unwrap();

        rewrite(&file, &GOOD.replace("4000", "6000"));
        let config = cache.load(file.path()).unwrap();

        assert_eq!(cache.parse_count(), 2);
        assert_eq!(config.timeout, Duration::from_millis(6000));
    }

    #[test]
    fn test_invalid_source_keeps_last_good() {
        let file = write_config(GOOD);
        let cache = ConfigCache::new();
        let good = cache.load(file.path()).unwrap();

        rewrite(&file, "[casting\ntimeout_ms = ");
        let err = cache.load(file.path()).unwrap_err();

        assert!(matches!(err, CastError::ConfigParse { .. }));
        assert!(Arc::ptr_eq(&cache.current(), &good));
    }

    #[test]
    fn test_force_reload_always_parses() {
        let file = write_config(GOOD);
        let cache = ConfigCache::new();
        let first = cache.load(file.path()).unwrap();

        let reloaded = cache.force_reload().unwrap();
        assert_eq!(cache.parse_count(), 2);
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(reloaded.source_hash, first.source_hash);
    }

    #[test]
    fn test_force_reload_without_source() {
        let cache = ConfigCache::new();
        assert!(matches!(cache.force_reload(), Err(CastError::NoConfigSource)));
        assert_eq!(cache.parse_count(), 0);
    }

    #[test]
    fn test_missing_file_keeps_defaults() {
        let cache = ConfigCache::new();
        let err = cache.load(Path::new("/nonexistent/casting.toml")).unwrap_err();
        assert!(matches!(err, CastError::ConfigIo { .. }));
        assert_eq!(cache.current().timeout, CastingConfig::default().timeout);
    }
}
