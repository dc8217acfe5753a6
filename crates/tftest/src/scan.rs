//! Fixture discovery

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Every file under `root` with the given extension, sorted by path.
pub fn find_fixtures(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == extension) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Directories containing at least one fixture, sorted. Each one becomes a
/// test case.
pub fn fixture_dirs(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let dirs: BTreeSet<PathBuf> = find_fixtures(root, extension)?
        .into_iter()
        .filter_map(|file| file.parent().map(Path::to_path_buf))
        .collect();
    Ok(dirs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_find_sorted_by_extension() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b/02.tf");
        touch(dir.path(), "b/01.tf");
        touch(dir.path(), "b/01.json");
        touch(dir.path(), "a/main.tf");
        touch(dir.path(), "a/notes.tf.bak");

        let found: Vec<_> = find_fixtures(dir.path(), "tf")
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a/main.tf"),
                PathBuf::from("b/01.tf"),
                PathBuf::from("b/02.tf"),
            ]
        );
    }

    #[test]
    fn test_fixture_dirs_unique() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "z/one.tf");
        touch(dir.path(), "z/two.tf");
        touch(dir.path(), "a/nested/one.tf");
        touch(dir.path(), "empty/readme.md");

        let dirs = fixture_dirs(dir.path(), "tf").unwrap();
        assert_eq!(
            dirs,
            vec![dir.path().join("a/nested"), dir.path().join("z")]
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(find_fixtures(&dir.path().join("absent"), "tf").is_err());
    }
}
