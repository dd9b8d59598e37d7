//! Common test helper functions.

use execprobe::fixture::FIXTURE_DIR_PREFIX;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Private directory to pass as `RunnerOptions::fixture_root`.
///
/// # Panics
/// Panics if the directory cannot be created.
#[must_use]
pub fn fixture_root() -> TempDir {
    #[allow(clippy::expect_used)]
    tempfile::Builder::new()
        .prefix("execprobe-test-")
        .tempdir()
        .expect("failed to create fixture root")
}

/// Fixture directories still present under `root`.
///
/// A missing or unreadable root counts as empty.
#[must_use]
pub fn leftover_fixtures(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(FIXTURE_DIR_PREFIX)
        })
        .map(|entry| entry.path())
        .collect()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn only_fixture_directories_are_reported() {
        let root = fixture_root();
        fs::create_dir(root.path().join(format!("{FIXTURE_DIR_PREFIX}abc"))).unwrap();
        fs::create_dir(root.path().join("unrelated")).unwrap();

        let leftovers = leftover_fixtures(root.path());
        assert_eq!(leftovers.len(), 1);
        assert!(leftovers[0].ends_with(format!("{FIXTURE_DIR_PREFIX}abc")));
    }

    #[test]
    fn missing_root_has_no_leftovers() {
        let root = fixture_root();
        assert!(leftover_fixtures(&root.path().join("missing")).is_empty());
    }
}
