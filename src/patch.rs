//! Manual query overrides for awkward venue names.
//!
//! Some DBLP venue names never match the ranking sources' own spelling
//! (abbreviated series names, merged venues). A patch file maps those names
//! to a hand-picked search query. Loaded once at startup, read-only after.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{RankerError, Result};
use crate::normalize::normalize;

/// One rewrite rule from the patch file.
#[derive(Debug, Deserialize)]
struct PatchRule {
    /// Venue name as displayed on the DBLP page
    dblp: String,
    /// Query to send to the ranking source instead
    query: String,
}

/// Immutable mapping from a normalized DBLP venue name to an override query.
#[derive(Debug, Default)]
pub struct PatchTable {
    rules: HashMap<String, String>,
}

impl PatchTable {
    /// Load rules from a JSON file: `[{"dblp": "...", "query": "..."}, ...]`.
    ///
    /// Both sides of every rule are normalized at load time. An unreadable
    /// or malformed file is fatal: queries would silently go unpatched.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RankerError::Config(format!("cannot read patch file {}: {}", path.display(), e))
        })?;
        let rules: Vec<PatchRule> = serde_json::from_str(&raw).map_err(|e| {
            RankerError::Config(format!("malformed patch file {}: {}", path.display(), e))
        })?;

        let rules: HashMap<String, String> = rules
            .into_iter()
            .map(|r| (normalize(&r.dblp), normalize(&r.query)))
            .collect();

        info!(count = rules.len(), path = %path.display(), "Loaded patch rules");
        Ok(Self { rules })
    }

    /// Look up the override query for a normalized venue name.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.rules.get(name).map(String::as_str)
    }

    /// Resolve a normalized venue name to its query: the patched query if a
    /// rule exists, the name itself otherwise.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.lookup(name).unwrap_or(name)
    }

    /// Number of loaded rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_rules(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write rules");
        file
    }

    #[test]
    fn test_resolve_patched_and_passthrough() -> Result<()> {
        let file = write_rules(
            r#"[{"dblp": "ICSE", "query": "International Conference Software Engineering"}]"#,
        );
        let table = PatchTable::load(file.path())?;

        // Any raw string normalizing to "icse" hits the rule.
        assert_eq!(
            table.resolve(&normalize("ICSE (41st edition)")),
            "international conference software engineering"
        );
        // Absent rule: name passes through unchanged.
        assert_eq!(table.resolve("pldi"), "pldi");
        assert!(table.lookup("pldi").is_none());
        Ok(())
    }

    #[test]
    fn test_rule_sides_are_normalized_at_load() -> Result<()> {
        let file = write_rules(r#"[{"dblp": "Foo, Bar (2019)", "query": "The  FOO Journal"}]"#);
        let table = PatchTable::load(file.path())?;
        assert_eq!(table.lookup("foo"), Some("the foo journal"));
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let file = write_rules(r#"{"dblp": "not an array"}"#);
        assert!(matches!(
            PatchTable::load(file.path()),
            Err(RankerError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        assert!(matches!(
            PatchTable::load(Path::new("/nonexistent/patch.json")),
            Err(RankerError::Config(_))
        ));
    }
}
