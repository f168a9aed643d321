//! List of watched folders keyed by path

use crate::types::DirectoryConfig;

/// Ordered list of [`DirectoryConfig`] with unique paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchedDirectories {
    entries: Vec<DirectoryConfig>,
}

impl WatchedDirectories {
    /// Build a list, keeping the first entry for any repeated path
    pub fn from_entries(entries: Vec<DirectoryConfig>) -> Self {
        let mut list = Self::default();
        for entry in entries {
            if !list.contains(&entry.path) {
                list.entries.push(entry);
            }
        }
        list
    }

    /// Get the entries in display order
    pub fn entries(&self) -> &[DirectoryConfig] {
        &self.entries
    }

    /// Consume the list
    pub fn into_entries(self) -> Vec<DirectoryConfig> {
        self.entries
    }

    /// Check if a path is already watched
    pub fn contains(&self, path: &str) -> bool {
        self.entries.iter().any(|d| d.path == path)
    }

    /// Look up a folder by path
    pub fn get(&self, path: &str) -> Option<&DirectoryConfig> {
        self.entries.iter().find(|d| d.path == path)
    }

    /// Enabled folders only
    pub fn enabled(&self) -> impl Iterator<Item = &DirectoryConfig> {
        self.entries.iter().filter(|d| d.enabled)
    }

    /// Number of folders
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no folder is watched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append new folders. Blank and already-watched paths are skipped.
    ///
    /// Returns the number of folders added.
    pub fn add_paths<I, S>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() || self.contains(path) {
                continue;
            }
            self.entries.push(DirectoryConfig::new(path));
            added += 1;
        }
        added
    }

    /// Stop watching a folder. Returns `true` if it was present.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|d| d.path != path);
        self.entries.len() != before
    }

    /// Flip `enabled` for one folder. Returns `false` for unknown paths.
    pub fn toggle_enabled(&mut self, path: &str) -> bool {
        match self.entries.iter_mut().find(|d| d.path == path) {
            Some(dir) => {
                dir.enabled = !dir.enabled;
                true
            }
            None => false,
        }
    }

    /// Flip `recursive` for one folder. Returns `false` for unknown paths.
    pub fn toggle_recursive(&mut self, path: &str) -> bool {
        match self.entries.iter_mut().find(|d| d.path == path) {
            Some(dir) => {
                dir.recursive = !dir.recursive;
                true
            }
            None => false,
        }
    }

    /// Stamp every enabled folder as indexed at `at` (epoch milliseconds)
    pub fn mark_enabled_indexed(&mut self, at: i64) {
        for dir in self.entries.iter_mut().filter(|d| d.enabled) {
            dir.last_indexed = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WatchedDirectories {
        WatchedDirectories::from_entries(vec![
            DirectoryConfig {
                path: "/a/b".to_string(),
                enabled: true,
                recursive: true,
                last_indexed: 1_700_000_000_000,
            },
            DirectoryConfig {
                path: "/c".to_string(),
                enabled: false,
                recursive: false,
                last_indexed: 42,
            },
        ])
    }

    #[test]
    fn test_from_entries_drops_duplicate_paths() {
        let mut first = DirectoryConfig::new("/x");
        first.recursive = false;
        let list = WatchedDirectories::from_entries(vec![first.clone(), DirectoryConfig::new("/x")]);
        assert_eq!(list.entries(), &[first]);
    }

    #[test]
    fn test_add_paths_to_empty_list() {
        let mut list = WatchedDirectories::default();
        assert_eq!(list.add_paths(["/x", "/y"]), 2);
        assert_eq!(list.len(), 2);
        for dir in list.entries() {
            assert!(dir.enabled);
            assert!(dir.recursive);
            assert_eq!(dir.last_indexed, 0);
        }

        assert_eq!(list.add_paths(["/x"]), 0);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_add_paths_skips_repeats_within_one_batch() {
        let mut list = WatchedDirectories::default();
        assert_eq!(list.add_paths(["/x", "/x", " ", "/y"]), 2);
    }

    #[test]
    fn test_toggle_enabled_leaves_everything_else() {
        let mut list = sample();
        let before = list.clone();

        assert!(list.toggle_enabled("/a/b"));

        let toggled = list.get("/a/b").unwrap();
        assert!(!toggled.enabled);
        assert_eq!(toggled.last_indexed, 1_700_000_000_000);
        assert_eq!(toggled.recursive, before.get("/a/b").unwrap().recursive);
        assert_eq!(list.get("/c"), before.get("/c"));
    }

    #[test]
    fn test_toggle_unknown_path_is_noop() {
        let mut list = sample();
        let before = list.clone();
        assert!(!list.toggle_enabled("/nope"));
        assert!(!list.toggle_recursive("/nope"));
        assert_eq!(list, before);
    }

    #[test]
    fn test_remove_and_mark_indexed() {
        let mut list = sample();
        list.mark_enabled_indexed(99);
        assert_eq!(list.get("/a/b").unwrap().last_indexed, 99);
        assert_eq!(list.get("/c").unwrap().last_indexed, 42);

        assert!(list.remove("/c"));
        assert!(!list.remove("/c"));
        assert_eq!(list.enabled().count(), 1);
    }
}
