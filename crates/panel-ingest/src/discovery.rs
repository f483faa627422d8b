//! Result-file discovery.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{IngestError, Result};

/// Walk `root` recursively and return every file whose name matches
/// `pattern`, sorted by path.
///
/// Matching nothing is not an error; an empty list is a valid result. Only
/// a missing or unreadable directory fails.
pub fn build_file_list(root: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut matched = Vec::new();
    walk(root, pattern, &mut matched)?;
    matched.sort();
    Ok(matched)
}

fn walk(dir: &Path, pattern: &Regex, matched: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if path.is_dir() {
            walk(&path, pattern, matched)?;
            continue;
        }

        let name = path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or_default();
        if pattern.is_match(name) {
            matched.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("batch1")).unwrap();
        std::fs::create_dir_all(dir.path().join("batch2/nested")).unwrap();
        for name in &[
            "batch1/urine_quant_report_b.xml",
            "batch1/notes.txt",
            "batch2/nested/urine_quant_report_b.xml",
            "top_quant_report_b.xml",
        ] {
            std::fs::write(dir.path().join(name), "content").unwrap();
        }
        dir
    }

    #[test]
    fn matches_recursively_and_sorts() {
        let dir = create_tree();
        let pattern = Regex::new(r".*?quant_report_b\.xml$").unwrap();
        let files = build_file_list(dir.path(), &pattern).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn no_match_is_an_empty_list_not_an_error() {
        let dir = create_tree();
        let pattern = Regex::new(r".*\.json$").unwrap();
        let files = build_file_list(dir.path(), &pattern).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let pattern = Regex::new(".*").unwrap();
        let err = build_file_list(Path::new("/no/such/dir"), &pattern).unwrap_err();
        assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
    }
}
