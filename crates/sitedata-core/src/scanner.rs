//! Directory scanner for discovering site data files and pages

use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find every file under `roots` with the given extension (case-insensitive).
///
/// Results are sorted by path so repeated scans load files in the same order.
pub fn scan_directory<P: AsRef<Path>>(roots: &[P], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in roots {
        for entry in WalkDir::new(root.as_ref()).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if has_extension(path, extension) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("top.csv"), "x\n1\n").unwrap();
        fs::write(dir.path().join("a/b/deep.CSV"), "x\n1\n").unwrap();
        fs::write(dir.path().join("a/page.html"), "<html></html>").unwrap();

        let files = scan_directory(&[dir.path()], "csv").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("top.csv")));
        assert!(files.iter().any(|p| p.ends_with("a/b/deep.CSV")));
    }

    #[test]
    fn test_scan_overlapping_roots_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let files = scan_directory(&[dir.path(), dir.path()], "html").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_scan_missing_root_is_an_error() {
        assert!(scan_directory(&[Path::new("/nonexistent/site")], "csv").is_err());
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("x.Html"), "html"));
        assert!(!has_extension(Path::new("x.htm"), "html"));
        assert!(!has_extension(Path::new("html"), "html"));
    }
}
