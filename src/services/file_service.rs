use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, error, warn};

use crate::errors::WikiError;
use crate::types::DirEntry;

/// Service for handling file system operations below one root directory
#[derive(Clone)]
pub struct FileService {
    base_dir: PathBuf,
}

impl FileService {
    /// Create a new file service
    pub fn new(base_dir: PathBuf) -> Self {
        debug!("Creating FileService with base directory: {:?}", base_dir);
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a relative path, refusing anything that escapes the root
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, WikiError> {
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            warn!("Rejected path outside of {:?}: {:?}", self.base_dir, path);
            return Err(WikiError::InvalidPath);
        }
        Ok(self.base_dir.join(path))
    }

    /// List directory contents, directories first, then by name
    pub fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>, WikiError> {
        let full_path = self.resolve(path)?;
        debug!("Listing directory: {:?} (full path: {:?})", path, full_path);

        if !full_path.exists() {
            warn!("Directory does not exist: {:?}", full_path);
            return Err(WikiError::NotFound);
        }
        if !full_path.is_dir() {
            warn!("Path is not a directory: {:?}", full_path);
            return Err(WikiError::InvalidPath);
        }

        let entries = fs::read_dir(&full_path).map_err(|e| {
            error!("Failed to read directory {:?}: {}", full_path, e);
            WikiError::Io(e)
        })?;

        let mut result = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
                    let name = entry.file_name().to_string_lossy().to_string();
                    let entry_path = if path.as_os_str().is_empty() {
                        PathBuf::from(&name)
                    } else {
                        path.join(&name)
                    };
                    result.push(DirEntry { name, is_dir, path: entry_path });
                }
                Err(e) => warn!("Failed to read directory entry: {}", e),
            }
        }

        result.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        debug!("Listed directory {:?}, found {} entries", path, result.len());
        Ok(result)
    }

    /// Read file content
    pub fn read_file(&self, path: &Path) -> Result<String, WikiError> {
        let full_path = self.resolve(path)?;
        debug!("Reading file: {:?} (full path: {:?})", path, full_path);

        if !full_path.exists() {
            warn!("File does not exist: {:?}", full_path);
            return Err(WikiError::NotFound);
        }
        if !full_path.is_file() {
            warn!("Path is not a file: {:?}", full_path);
            return Err(WikiError::InvalidPath);
        }

        fs::read_to_string(&full_path).map_err(|e| {
            error!("Failed to read file {:?}: {}", full_path, e);
            WikiError::Io(e)
        })
    }

    /// Every non-hidden Markdown file below the root, as relative paths
    pub fn markdown_files(&self) -> Result<Vec<PathBuf>, WikiError> {
        let mut files = Vec::new();
        let mut pending = vec![PathBuf::new()];
        while let Some(dir) = pending.pop() {
            for entry in self.list_directory(&dir)? {
                if entry.name.starts_with('.') {
                    continue;
                }
                if entry.is_dir {
                    pending.push(entry.path);
                } else if is_markdown(&entry.path) {
                    files.push(entry.path);
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Determine content type for a file
    pub fn content_type_for(&self, path: &Path) -> &'static str {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "txt" => "text/plain",
            "md" => "text/markdown",
            _ => "application/octet-stream",
        }
    }
}

/// Check if a file is markdown
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("home.md"), "# Home").unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide/intro.md"), "# Intro").unwrap();
        fs::write(dir.path().join("guide/logo.png"), [0u8; 4]).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD.md"), "ref").unwrap();
        dir
    }

    #[test]
    fn listing_puts_directories_first() {
        let dir = wiki();
        let service = FileService::new(dir.path().to_path_buf());
        let names: Vec<String> = service
            .list_directory(Path::new(""))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec![".git", "guide", "home.md"]);
    }

    #[test]
    fn markdown_files_skip_hidden_and_assets() {
        let dir = wiki();
        let service = FileService::new(dir.path().to_path_buf());
        let files = service.markdown_files().unwrap();
        assert_eq!(files, vec![PathBuf::from("guide/intro.md"), PathBuf::from("home.md")]);
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = wiki();
        let service = FileService::new(dir.path().to_path_buf());
        assert!(matches!(
            service.read_file(Path::new("../etc/passwd")),
            Err(WikiError::InvalidPath)
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = wiki();
        let service = FileService::new(dir.path().to_path_buf());
        assert!(matches!(service.read_file(Path::new("nope.md")), Err(WikiError::NotFound)));
        assert!(matches!(service.read_file(Path::new("guide")), Err(WikiError::InvalidPath)));
    }
}
