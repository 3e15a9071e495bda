use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::WikiError;
use crate::services::search_service::{match_document, rank};
use crate::services::FileService;
use crate::types::SearchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedPage {
    path: PathBuf,
    content: String,
}

/// In-memory full-text index over the wiki's Markdown pages
#[derive(Debug, Default)]
pub struct SearchIndex {
    pages: RwLock<Option<Vec<IndexedPage>>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the index has been built at least once
    pub fn is_built(&self) -> bool {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of indexed pages
    pub fn len(&self) -> usize {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every indexed page
    pub fn clear(&self) {
        *self.pages.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Re-read every page below the file service root, replacing the index
    pub fn rebuild(&self, files: &FileService) -> Result<usize, WikiError> {
        let start = std::time::Instant::now();
        let mut pages = Vec::new();
        for path in files.markdown_files()? {
            match files.read_file(&path) {
                Ok(content) => pages.push(IndexedPage { path, content }),
                Err(e) => warn!("Skipping {:?} while indexing: {}", path, e),
            }
        }

        let count = pages.len();
        *self.pages.write().unwrap_or_else(PoisonError::into_inner) = Some(pages);
        info!("Indexed {} pages in {}ms", count, start.elapsed().as_millis());
        Ok(count)
    }

    /// Write the current pages to `path` as JSON
    pub fn save(&self, path: &Path) -> Result<usize, WikiError> {
        let guard = self.pages.read().unwrap_or_else(PoisonError::into_inner);
        let pages = guard
            .as_ref()
            .ok_or_else(|| WikiError::SearchError("search index has not been built".to_string()))?;

        let json = serde_json::to_vec(pages)
            .map_err(|e| WikiError::SearchError(format!("cannot encode index: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // write beside the target, then swap it in
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!("Saved {} indexed pages to {:?}", pages.len(), path);
        Ok(pages.len())
    }

    /// Replace the index with pages previously written by [`SearchIndex::save`]
    pub fn load(&self, path: &Path) -> Result<usize, WikiError> {
        let raw = fs::read(path)?;
        let pages: Vec<IndexedPage> = serde_json::from_slice(&raw).map_err(|e| {
            WikiError::SearchError(format!("corrupt index {}: {e}", path.display()))
        })?;

        let count = pages.len();
        *self.pages.write().unwrap_or_else(PoisonError::into_inner) = Some(pages);
        info!("Loaded {} indexed pages from {:?}", count, path);
        Ok(count)
    }

    /// Query the index; an unbuilt index is a search error
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, WikiError> {
        let guard = self.pages.read().unwrap_or_else(PoisonError::into_inner);
        let pages = guard
            .as_ref()
            .ok_or_else(|| WikiError::SearchError("search index has not been built".to_string()))?;

        let mut results: Vec<SearchResult> = pages
            .iter()
            .filter_map(|page| match_document(&page.path, &page.content, query))
            .collect();
        rank(&mut results);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unbuilt_index_refuses_queries() {
        let index = SearchIndex::new();
        assert!(!index.is_built());
        assert!(matches!(index.search("x"), Err(WikiError::SearchError(_))));
    }

    #[test]
    fn rebuild_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "# Alpha\n\nfirst page").unwrap();
        let files = FileService::new(dir.path().to_path_buf());

        let index = SearchIndex::new();
        assert_eq!(index.rebuild(&files).unwrap(), 1);
        assert_eq!(index.search("first").unwrap().len(), 1);

        fs::write(dir.path().join("b.md"), "# Beta\n\nsecond page").unwrap();
        assert_eq!(index.search("second").unwrap().len(), 0);
        assert_eq!(index.rebuild(&files).unwrap(), 2);
        let hits = index.search("page").unwrap();
        assert_eq!(hits.len(), 2);

        index.clear();
        assert!(!index.is_built());
    }

    #[test]
    fn saved_index_loads_into_a_fresh_one() {
        let dir = tempfile::tempdir().unwrap();
        let wiki = dir.path().join("wiki");
        fs::create_dir(&wiki).unwrap();
        fs::write(wiki.join("a.md"), "# Alpha\n\nstored page").unwrap();
        let file = dir.path().join("cache/index.json");

        let index = SearchIndex::new();
        index.rebuild(&FileService::new(wiki.clone())).unwrap();
        assert_eq!(index.save(&file).unwrap(), 1);

        fs::remove_file(wiki.join("a.md")).unwrap();
        let loaded = SearchIndex::new();
        assert_eq!(loaded.load(&file).unwrap(), 1);
        assert_eq!(loaded.search("stored").unwrap().len(), 1);
    }

    #[test]
    fn unbuilt_index_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.json");
        assert!(SearchIndex::new().save(&file).is_err());
        assert!(!file.exists());
    }

    #[test]
    fn corrupt_file_is_a_search_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.json");
        fs::write(&file, "not json").unwrap();
        assert!(matches!(SearchIndex::new().load(&file), Err(WikiError::SearchError(_))));
    }
}
