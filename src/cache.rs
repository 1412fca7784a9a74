//! Persistent rank cache, one instance per ranking source.
//!
//! Keys are the flat concatenation `query + year`; the on-disk format is a
//! single JSON object mapping each composite key to
//! `{"rank": "...", "year": "..."}`, compatible with existing cache files.
//! A missing or corrupt file yields an empty cache; the run continues
//! without it.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Cached outcome of a single rank lookup.
///
/// `year` is the ranking epoch label (CORE) or the history year the rank was
/// taken from (Scimago), kept as a string either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRank {
    pub rank: String,
    pub year: String,
}

/// Unbounded key→rank map with opt-in file persistence.
pub struct RankCache {
    path: PathBuf,
    entries: HashMap<String, CachedRank>,
}

impl RankCache {
    /// Create an empty in-memory cache bound to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: HashMap::new(),
        }
    }

    /// Load a cache from `path`.
    ///
    /// A missing or unreadable file is not an error: the cache starts empty
    /// and the condition is logged.
    pub fn load(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, CachedRank>>(&content) {
                Ok(entries) => {
                    info!(count = entries.len(), path = %path.display(), "Loaded rank cache");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt rank cache, starting empty");
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No rank cache on disk, starting empty");
                HashMap::new()
            }
        };
        Self { path, entries }
    }

    /// Composite cache key for a query and publication year.
    pub fn key(query: &str, year: i32) -> String {
        format!("{}{}", query, year)
    }

    pub fn get(&self, key: &str) -> Option<&CachedRank> {
        self.entries.get(key)
    }

    pub fn put(&mut self, key: String, record: CachedRank) {
        debug!(key = %key, rank = %record.rank, "Caching rank");
        self.entries.insert(key, record);
    }

    /// Overwrite the cache file wholesale with the current contents.
    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, content)?;
        info!(count = self.entries.len(), path = %self.path.display(), "Saved rank cache");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_file_yields_empty() {
        let cache = RankCache::load(PathBuf::from("/nonexistent/core.cache"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_yields_empty() -> Result<()> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), "not json")?;
        let cache = RankCache::load(file.path().to_path_buf());
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_then_load_round_trips_every_pair() -> Result<()> {
        let file = NamedTempFile::new()?;
        let mut cache = RankCache::new(file.path().to_path_buf());
        cache.put(
            RankCache::key("icse", 2019),
            CachedRank {
                rank: "A*".to_string(),
                year: "CORE2018".to_string(),
            },
        );
        cache.put(
            RankCache::key("acta informatica", 2015),
            CachedRank {
                rank: "Q2".to_string(),
                year: "2015".to_string(),
            },
        );
        cache.save()?;

        let reloaded = RankCache::load(file.path().to_path_buf());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get("icse2019"),
            Some(&CachedRank {
                rank: "A*".to_string(),
                year: "CORE2018".to_string(),
            })
        );
        assert_eq!(
            reloaded.get("acta informatica2015"),
            Some(&CachedRank {
                rank: "Q2".to_string(),
                year: "2015".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_persisted_format_is_flat_json_object() -> Result<()> {
        let file = NamedTempFile::new()?;
        let mut cache = RankCache::new(file.path().to_path_buf());
        cache.put(
            RankCache::key("icse", 2019),
            CachedRank {
                rank: "A*".to_string(),
                year: "CORE2018".to_string(),
            },
        );
        cache.save()?;

        let raw = std::fs::read_to_string(file.path())?;
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(value["icse2019"]["rank"], "A*");
        assert_eq!(value["icse2019"]["year"], "CORE2018");
        Ok(())
    }
}
