use std::cmp::Ordering;
use std::path::Path;

use log::{debug, info, warn};

use crate::errors::WikiError;
use crate::services::FileService;
use crate::types::SearchResult;

/// Longest query accepted; longer input is truncated on a char boundary
pub const MAX_QUERY_CHARS: usize = 1000;

/// Service that scans the wiki directory on every query
pub struct SearchService {
    file_service: FileService,
}

impl SearchService {
    /// Create a new search service
    pub fn new(file_service: FileService) -> Self {
        Self { file_service }
    }

    /// Search for content in the wiki
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>, WikiError> {
        if query.trim().is_empty() {
            debug!("Empty search query received");
            return Ok(Vec::new());
        }

        info!("Scanning wiki for query: '{}'", query);
        let start_time = std::time::Instant::now();

        let mut results = Vec::new();
        for path in self.file_service.markdown_files()? {
            match self.file_service.read_file(&path) {
                Ok(content) => {
                    if let Some(result) = match_document(&path, &content, query) {
                        results.push(result);
                    }
                }
                Err(e) => warn!("Failed to read file {:?}: {}", path, e),
            }
        }
        rank(&mut results);

        info!(
            "Search completed in {}ms, found {} results",
            start_time.elapsed().as_millis(),
            results.len()
        );
        Ok(results)
    }
}

/// Build a result for one document, or `None` when the query does not occur
pub fn match_document(path: &Path, content: &str, query: &str) -> Option<SearchResult> {
    let query_lower = query.to_lowercase();
    if query_lower.trim().is_empty() || !content.to_lowercase().contains(&query_lower) {
        return None;
    }
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    Some(SearchResult {
        title: extract_title(content, file_name),
        path: path.with_extension("").to_string_lossy().replace('\\', "/"),
        excerpt: generate_excerpt(content, query),
        relevance: calculate_relevance(content, query),
    })
}

/// Highest relevance first, ties broken by path
pub fn rank(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
}

/// Truncate a query to [`MAX_QUERY_CHARS`] characters
pub fn clamp_query(query: &str) -> &str {
    match query.char_indices().nth(MAX_QUERY_CHARS) {
        Some((idx, _)) => {
            warn!("Very long search query received, truncating");
            &query[..idx]
        }
        None => query,
    }
}

/// Extract title from front matter or first heading, else the file name
pub fn extract_title(content: &str, filename: &str) -> String {
    let (front_title, body) = crate::services::markdown_service::split_front_matter(content);
    if let Some(title) = front_title {
        return title;
    }
    if let Some(first_line) = body.lines().find(|l| !l.trim().is_empty()) {
        if first_line.starts_with('#') {
            let title = first_line.trim_start_matches('#').trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
    }
    filename.trim_end_matches(".md").to_string()
}

/// Calculate search relevance score
pub fn calculate_relevance(content: &str, query: &str) -> f32 {
    let content_lower = content.to_lowercase();
    let query_lower = query.to_lowercase();
    let words: Vec<&str> = query_lower.split_whitespace().filter(|w| w.len() > 2).collect();

    let mut score = 0.0;

    // exact phrase
    if content_lower.contains(&query_lower) {
        score += 20.0;
    }

    for word in &words {
        if content_lower.contains(word) {
            score += 3.0;
        }
    }

    if let Some(first_line) = content_lower.lines().next() {
        if first_line.contains(&query_lower) {
            score += 15.0;
        }
        score += 5.0 * words.iter().filter(|w| first_line.contains(**w)).count() as f32;
    }

    let headings = content_lower
        .lines()
        .filter(|l| l.starts_with('#') && l.contains(&query_lower))
        .count();
    score += 8.0 * headings as f32;

    score
}

/// Excerpt of roughly 100 characters either side of the first match
pub fn generate_excerpt(content: &str, query: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let lowered: Vec<char> = chars.iter().flat_map(|c| c.to_lowercase()).collect();
    let needle: Vec<char> = query.to_lowercase().chars().collect();

    // lowercase can change char counts; only trust positions when it did not
    let position = if lowered.len() == chars.len() && !needle.is_empty() {
        lowered.windows(needle.len()).position(|w| w == needle.as_slice())
    } else {
        None
    };

    let Some(pos) = position else {
        return content
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with("---"))
            .map(|l| {
                if l.chars().count() > 50 {
                    format!("{}...", l.chars().take(50).collect::<String>())
                } else {
                    l.to_string()
                }
            })
            .unwrap_or_default();
    };

    let start = pos.saturating_sub(100);
    let end = (pos + needle.len() + 100).min(chars.len());
    let mut excerpt: String = chars[start..end].iter().collect();

    if start > 0 {
        if let Some(space) = excerpt.find(' ') {
            excerpt = excerpt[space + 1..].to_string();
        }
        excerpt = format!("...{excerpt}");
    }
    if end < chars.len() {
        excerpt.push_str("...");
    }
    excerpt.replace('\n', " ")
}
