// Metadata cache - one JSON file per link, invalidated by file age

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use super::models::Metadata;

const CACHE_FILE_EXT: &str = "json";

/// On-disk cache of extracted metadata.
///
/// Freshness comes from the file's modification time, never from the
/// content. Writes go to a sibling temp file that is renamed into place,
/// so readers see either a complete record or nothing. There is no
/// cross-process locking: concurrent writers for one key race and the
/// last rename wins.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    dir: PathBuf,
    ttl_secs: u64,
    enabled: bool,
}

impl MetadataCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_secs: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl_secs,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stable, filesystem-safe key for a link (hex SHA-256).
    pub fn key_for(link: &str) -> String {
        hex::encode(Sha256::digest(link.as_bytes()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, CACHE_FILE_EXT))
    }

    fn is_fresh(&self, modified: SystemTime) -> bool {
        let age = OffsetDateTime::now_utc() - OffsetDateTime::from(modified);
        age < time::Duration::seconds(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX))
    }

    /// Cached record for `key` if present, non-empty, parseable and
    /// younger than the TTL.
    pub fn load(&self, key: &str) -> Option<Metadata> {
        if !self.enabled {
            return None;
        }

        let path = self.path_for(key);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if !self.is_fresh(modified) {
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        let text = fs::read_to_string(&path).ok()?;
        if text.trim().is_empty() {
            return None;
        }

        match Metadata::from_json(&text) {
            Ok(meta) => Some(meta),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Persist `metadata` under `key`. Never fails loudly: returns
    /// whether the record is now on disk.
    pub fn write(&self, key: &str, metadata: &Metadata) -> bool {
        if !self.enabled {
            return false;
        }

        match self.try_write(key, metadata) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, dir = %self.dir.display(), error = %e, "cache write failed");
                false
            }
        }
    }

    fn try_write(&self, key: &str, metadata: &Metadata) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let body = metadata
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".pending-")
            .tempfile_in(&self.dir)?;
        tmp.write_all(body.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Drop the entry for `key`. Returns whether a file was removed.
    pub fn remove(&self, key: &str) -> bool {
        self.enabled && fs::remove_file(self.path_for(key)).is_ok()
    }

    /// Delete every stale cache file, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        if !self.enabled {
            return 0;
        }

        let Ok(dir) = fs::read_dir(&self.dir) else {
            return 0;
        };

        let mut removed = 0;
        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_FILE_EXT) {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| !self.is_fresh(modified))
                .unwrap_or(false);
            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, "purged expired cache entries");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    fn sample() -> Metadata {
        Metadata::from_value(json!({"id": "abc", "title": "Song", "url": "https://cdn/x"})).unwrap()
    }

    fn age_file(path: &Path, by: Duration) {
        let file = fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_key_is_stable_and_distinct() {
        let a = MetadataCache::key_for("https://example.com/watch?v=1");
        let b = MetadataCache::key_for("https://example.com/watch?v=2");
        assert_eq!(a, MetadataCache::key_for("https://example.com/watch?v=1"));
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path().join("nested/cache"), 60);
        let key = MetadataCache::key_for("link");

        assert!(cache.load(&key).is_none());
        assert!(cache.write(&key, &sample()));
        assert_eq!(cache.load(&key), Some(sample()));
    }

    #[test]
    fn test_expired_entry_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path(), 60);
        let key = MetadataCache::key_for("link");

        assert!(cache.write(&key, &sample()));
        age_file(&cache.path_for(&key), Duration::from_secs(3600));
        assert!(cache.load(&key).is_none());
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path(), 0);
        let key = MetadataCache::key_for("link");
        assert!(cache.write(&key, &sample()));
        assert!(cache.load(&key).is_none());
    }

    #[test]
    fn test_empty_and_corrupt_files_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path(), 60);

        fs::write(cache.path_for("empty"), "").unwrap();
        fs::write(cache.path_for("corrupt"), "{\"title\": ").unwrap();
        assert!(cache.load("empty").is_none());
        assert!(cache.load("corrupt").is_none());
    }

    #[test]
    fn test_disabled_is_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path().join("c"), 60).with_enabled(false);
        let key = MetadataCache::key_for("link");

        assert!(!cache.write(&key, &sample()));
        assert!(cache.load(&key).is_none());
        assert!(!dir.path().join("c").exists());
    }

    #[test]
    fn test_unwritable_dir_fails_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();

        let cache = MetadataCache::new(blocker.join("cache"), 60);
        assert!(!cache.write("k", &sample()));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path(), 60);
        let mut updated = sample();
        updated.insert("title", json!("Other"));

        assert!(cache.write("k", &sample()));
        assert!(cache.write("k", &updated));
        assert_eq!(cache.load("k"), Some(updated));
        assert!(cache.remove("k"));
        assert!(cache.load("k").is_none());
    }

    #[test]
    fn test_purge_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = MetadataCache::new(dir.path(), 60);

        assert!(cache.write("old", &sample()));
        assert!(cache.write("new", &sample()));
        age_file(&cache.path_for("old"), Duration::from_secs(600));

        assert_eq!(cache.purge_expired(), 1);
        assert!(!cache.path_for("old").exists());
        assert!(cache.load("new").is_some());
    }
}
