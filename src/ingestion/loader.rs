//! Corpus file discovery and loading

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::Document;

/// Extensions with a registered loader. Only Markdown for now.
const REGISTERED_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Loads corpus files into `Document` records.
///
/// Synchronous batch operation with no network I/O.
#[derive(Debug, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self
    }

    /// Whether the path's extension has a registered loader
    pub fn is_registered(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| REGISTERED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Load a single file as a UTF-8 document.
    ///
    /// Fails with `UnsupportedExtension` when the extension has no
    /// registered loader and `DocumentRead` when the file cannot be read.
    pub fn load_file(&self, path: &Path) -> Result<Document> {
        if !self.is_registered(path) {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            return Err(Error::UnsupportedExtension(ext));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::document_read(path.display().to_string(), e.to_string()))?;

        let source_id = source_id_for(path);
        Ok(Document::new(path.to_path_buf(), source_id, content))
    }

    /// Discover and load every registered file under `root`.
    ///
    /// Unreadable files fail the whole load; nothing is skipped silently.
    pub fn load_dir(&self, root: &Path) -> Result<Vec<Document>> {
        let mut paths: Vec<PathBuf> = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry
                .map_err(|e| Error::directory_scan(root.display().to_string(), e.to_string()))?;
            if entry.file_type().is_file() && self.is_registered(entry.path()) {
                paths.push(entry.path().to_path_buf());
            }
        }
        paths.sort();

        tracing::info!("Discovered {} corpus files under {}", paths.len(), root.display());

        paths.iter().map(|p| self.load_file(p)).collect()
    }
}

/// Stable source identifier: the path with separators normalized to `/`
fn source_id_for(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_markdown_files_from_a_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.markdown"), "beta").unwrap();
        fs::write(dir.path().join("ignored.txt"), "nope").unwrap();

        let docs = DocumentLoader::new().load_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|d| d.content == "alpha"));
        assert!(docs.iter().any(|d| d.content == "beta"));
    }

    #[test]
    fn source_ids_are_unique_and_stable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.md"), "alpha").unwrap();
        fs::write(dir.path().join("b.md"), "beta").unwrap();

        let loader = DocumentLoader::new();
        let first = loader.load_dir(dir.path()).unwrap();
        let second = loader.load_dir(dir.path()).unwrap();

        let ids: Vec<_> = first.iter().map(|d| d.source_id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(
            ids,
            second.iter().map(|d| d.source_id.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn unregistered_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "text").unwrap();

        let err = DocumentLoader::new().load_file(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExtension(ext) if ext == "txt"));
    }

    #[test]
    fn unreadable_file_is_a_document_read_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.md");
        let err = DocumentLoader::new().load_file(&missing).unwrap_err();
        assert!(matches!(err, Error::DocumentRead { .. }));
    }

    #[test]
    fn missing_directory_is_a_scan_error() {
        let err = DocumentLoader::new()
            .load_dir(Path::new("/nonexistent/corpus/root"))
            .unwrap_err();
        assert!(matches!(err, Error::DirectoryScan { .. }));
    }
}
