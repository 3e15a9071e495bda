use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::services::SearchIndex;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub base_dir: Arc<PathBuf>,
    pub static_dir: Arc<PathBuf>,
    /// Prefix every module route is mounted under (`""` or `/segment`)
    pub url_prefix: Arc<str>,
    pub search_index: Arc<SearchIndex>,
}

impl AppState {
    pub fn new(config: Config, url_prefix: String) -> Self {
        Self {
            base_dir: Arc::new(config.wiki_path.clone()),
            static_dir: Arc::new(config.static_path.clone()),
            config: Arc::new(config),
            url_prefix: Arc::from(url_prefix),
            search_index: Arc::new(SearchIndex::new()),
        }
    }

    /// Absolute URL for a wiki-relative path
    pub fn url(&self, path: &str) -> String {
        crate::utils::join_url(&self.url_prefix, path)
    }
}

/// Directory entry information
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub path: PathBuf,
}

/// Search result information
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub title: String,
    pub path: String,
    pub excerpt: String,
    pub relevance: f32,
}

/// Markdown rendering result
#[derive(Debug, Clone)]
pub struct MarkdownResult {
    pub html: String,
    pub toc: String,
    pub title: Option<String>,
}

/// Stylesheets and scripts a page pulls in, relative to `/static`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAssets {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl Default for PageAssets {
    fn default() -> Self {
        Self {
            css: vec!["css/realms.css".to_string()],
            js: vec!["js/realms.js".to_string()],
        }
    }
}

/// Template rendering context
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub title: String,
    pub content: String,
    pub sidebar: String,
    pub fab: String,
    pub toc: Option<String>,
    pub assets: PageAssets,
}
