use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::LoadError;
use super::loader::load_records;
use super::model::CleanedTable;
use super::normalize::{normalize, NormalizeRules};

/// Identity of a source file: its canonical path when it resolves,
/// otherwise the path as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey(PathBuf);

impl SourceKey {
    pub fn for_path(path: &Path) -> Self {
        SourceKey(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Read and normalize a source in one step, bypassing any cache.
pub fn load_cleaned(path: &Path, rules: &NormalizeRules) -> Result<CleanedTable, LoadError> {
    let raw = load_records(path)?;
    normalize(raw, rules)
}

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// Memoized cleaned tables, one per source, owned by the application state.
///
/// Sources are treated as immutable for the session; a changed file is only
/// re-read after [`SourceCache::invalidate`]. Failed loads are not cached.
#[derive(Debug)]
pub struct SourceCache {
    rules: NormalizeRules,
    entries: HashMap<SourceKey, Arc<CleanedTable>>,
}

impl SourceCache {
    pub fn new(rules: NormalizeRules) -> Self {
        Self {
            rules,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<CleanedTable>, LoadError> {
        let key = SourceKey::for_path(path);
        if let Some(table) = self.entries.get(&key) {
            log::debug!("cache hit for {}", key.path().display());
            return Ok(Arc::clone(table));
        }

        log::info!("loading observations from {}", path.display());
        let table = Arc::new(load_cleaned(path, &self.rules)?);
        log::info!(
            "{} observations retained from {}",
            table.len(),
            path.display()
        );
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Forget one source so the next `get_or_load` re-reads it.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(&SourceKey::for_path(path)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "observed_on,scientific_name,common_name,latitude,longitude,image_url\n";

    fn write_csv(path: &Path, body: &str) {
        std::fs::write(path, format!("{HEADER}{body}")).unwrap();
    }

    #[test]
    fn second_load_is_served_from_cache_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        write_csv(&path, "2019-06-14,Ursus americanus,American Black Bear,49.0,-123.0,\n");

        let mut cache = SourceCache::new(NormalizeRules::default());
        let first = cache.get_or_load(&path).unwrap();
        assert_eq!(first.len(), 1);

        write_csv(
            &path,
            "2019-06-14,Ursus americanus,American Black Bear,49.0,-123.0,\n\
             2020-06-14,Ursus arctos,Grizzly Bear,51.0,-120.0,\n",
        );
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        assert!(cache.invalidate(&path));
        let third = cache.get_or_load(&path).unwrap();
        assert_eq!(third.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn relative_and_absolute_paths_share_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        write_csv(&path, "2021-01-01,Ursus arctos,Grizzly Bear,51.0,-120.0,\n");

        let mut cache = SourceCache::new(NormalizeRules::default());
        let first = cache.get_or_load(&path).unwrap();
        let dotted = dir.path().join(".").join("obs.csv");
        let second = cache.get_or_load(&dotted).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.csv");

        let mut cache = SourceCache::new(NormalizeRules::default());
        assert!(matches!(
            cache.get_or_load(&path),
            Err(LoadError::SourceUnavailable { .. })
        ));
        assert_eq!(cache.len(), 0);

        write_csv(&path, "2021-01-01,Ursus arctos,Grizzly Bear,51.0,-120.0,\n");
        assert_eq!(cache.get_or_load(&path).unwrap().len(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obs.csv");
        write_csv(&path, "2021-01-01,Ursus arctos,Grizzly Bear,51.0,-120.0,\n");

        let mut cache = SourceCache::new(NormalizeRules::default());
        cache.get_or_load(&path).unwrap();
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
