use std::path::Path;

use log::debug;

use crate::errors::WikiError;
use crate::services::FileService;
use crate::types::DirEntry;
use crate::utils::{escape_attr, escape_html, join_url};

/// Component for handling navigation and sidebar generation
pub struct NavigationComponent {
    file_service: FileService,
    prefix: String,
}

impl NavigationComponent {
    /// Create a new navigation component
    pub fn new(file_service: FileService, prefix: &str) -> Self {
        Self { file_service, prefix: prefix.to_string() }
    }

    /// Build sidebar HTML followed by the page's table of contents
    pub fn build_sidebar_with_toc(&self, current_path: &str, toc: &str) -> Result<String, WikiError> {
        let mut html = self.build_sidebar_html(current_path)?;
        if !toc.is_empty() {
            html.push_str(&format!(
                "<div class=\"sidebar-toc\"><h4 class=\"sidebar-toc-title\">On This Page</h4>{toc}</div>"
            ));
        }
        Ok(html)
    }

    /// Build the two-level sidebar, always listed from the wiki root
    pub fn build_sidebar_html(&self, current_path: &str) -> Result<String, WikiError> {
        debug!("Building sidebar HTML for path: '{}'", current_path);

        let mut html = String::from("<div class=\"sidebar-nav\"><h3>Navigation</h3><ul class=\"nav-list\">");
        for entry in self.visible(Path::new(""))? {
            if entry.name == "index.md" {
                continue;
            }
            let rel = page_path(&entry);
            let is_current = current_path == rel
                || (entry.is_dir && current_path.starts_with(&format!("{rel}/")));
            let current_class = if is_current { " current" } else { "" };

            if entry.is_dir {
                html.push_str(&format!(
                    "<li class=\"nav-item has-sub{current_class}\"><div class=\"nav-header\">\
                     <span class=\"nav-toggle\"></span><span class=\"nav-text\">{}</span></div>\
                     <ul class=\"nav-sub-list\">",
                    escape_html(&entry.name)
                ));
                // unreadable subdirectories only lose their children
                if let Ok(children) = self.visible(&entry.path) {
                    for child in children {
                        let child_rel = page_path(&child);
                        let class = if current_path == child_rel { " class=\"current\"" } else { "" };
                        html.push_str(&self.link_item(&child, &child_rel, class));
                    }
                }
                html.push_str("</ul></li>");
            } else {
                let class = if is_current { " class=\"current\"" } else { "" };
                html.push_str(&self.link_item(&entry, &rel, class));
            }
        }
        html.push_str("</ul></div>");
        Ok(html)
    }

    fn visible(&self, dir: &Path) -> Result<Vec<DirEntry>, WikiError> {
        Ok(self
            .file_service
            .list_directory(dir)?
            .into_iter()
            .filter(|e| !e.name.starts_with('.'))
            .collect())
    }

    fn link_item(&self, entry: &DirEntry, rel: &str, class: &str) -> String {
        format!(
            "<li{class}><a href=\"{}\">{}</a></li>",
            escape_attr(&join_url(&self.prefix, rel)),
            escape_html(entry.name.trim_end_matches(".md"))
        )
    }
}

/// URL path of an entry: directories as-is, Markdown files without `.md`
fn page_path(entry: &DirEntry) -> String {
    let rel = entry.path.to_string_lossy().replace('\\', "/");
    if entry.is_dir {
        rel
    } else {
        rel.trim_end_matches(".md").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sidebar_marks_current_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.md"), "# Home").unwrap();
        fs::write(dir.path().join("about.md"), "# About").unwrap();
        fs::create_dir(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide/intro.md"), "# Intro").unwrap();

        let nav = NavigationComponent::new(FileService::new(dir.path().to_path_buf()), "/wiki");
        let html = nav.build_sidebar_html("guide/intro").unwrap();
        assert!(html.contains("<li class=\"current\"><a href=\"/wiki/guide/intro\">intro</a></li>"));
        assert!(html.contains("has-sub current"));
        assert!(html.contains("href=\"/wiki/about\""));
        assert!(!html.contains("index"));
    }
}
