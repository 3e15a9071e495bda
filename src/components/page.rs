use std::path::Path;

use axum::response::Html;

use crate::components::{FabComponent, NavigationComponent, TemplateComponent};
use crate::errors::WikiError;
use crate::services::{FileService, MarkdownService};
use crate::types::{AppState, PageAssets};
use crate::utils::{escape_attr, escape_html, last_modified_html};

/// Puts content into the full page shell for one request
pub struct PageRenderer {
    files: FileService,
    navigation: NavigationComponent,
    fab: FabComponent,
    templates: TemplateComponent,
    assets: PageAssets,
    prefix: String,
}

impl PageRenderer {
    pub fn new(state: &AppState, assets: PageAssets) -> Self {
        let files = FileService::new(state.base_dir.as_ref().clone());
        Self {
            navigation: NavigationComponent::new(files.clone(), &state.url_prefix),
            fab: FabComponent::new(&state.url_prefix),
            templates: TemplateComponent::new(&state.static_dir, &state.url_prefix),
            prefix: state.url_prefix.to_string(),
            files,
            assets,
        }
    }

    pub fn files(&self) -> &FileService {
        &self.files
    }

    /// Wrap `content` with sidebar, action bar and shell
    pub fn page(&self, req_path: &str, title: &str, content: &str, toc: Option<&str>) -> Result<Html<String>, WikiError> {
        let sidebar = match toc {
            Some(toc) => self.navigation.build_sidebar_with_toc(req_path, toc)?,
            None => self.navigation.build_sidebar_html(req_path)?,
        };
        let actions = self.fab.generate_actions(req_path);
        let fab_html = self.fab.generate_fab_html(req_path, &actions);
        let page = self
            .templates
            .render_page(&sidebar, content, &fab_html, title, toc, &self.assets)?;
        Ok(Html(page))
    }

    /// Render a Markdown file (relative to the wiki root) as a page
    pub fn markdown(&self, file: &Path, req_path: &str) -> Result<Html<String>, WikiError> {
        let content = self.files.read_file(file)?;
        let result = MarkdownService::new().render_with_toc(&content)?;
        let meta = last_modified_html(&self.files.resolve(file)?);
        let body = format!("{}{}", meta, result.html);
        let fallback = if req_path.is_empty() { "Wiki" } else { req_path };
        let title = result.title.as_deref().unwrap_or(fallback);
        self.page(req_path, title, &body, Some(&result.toc))
    }

    /// Directory listing page
    pub fn listing(&self, req_path: &str) -> Result<Html<String>, WikiError> {
        let entries = self.files.list_directory(Path::new(req_path))?;
        let heading = format!("/{req_path}");
        let mut html = format!("<h1>{}</h1>", escape_html(&heading));

        if !req_path.is_empty() {
            let parent = req_path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
            html.push_str(&format!(
                "<p><a href=\"{}\">⬑ Up</a></p>",
                escape_attr(&crate::utils::join_url(&self.prefix, parent))
            ));
        }

        html.push_str("<ul class=\"listing\">\n");
        for entry in entries.iter().filter(|e| !e.name.starts_with('.')) {
            let rel = entry.path.to_string_lossy().replace('\\', "/");
            let (href, display) = if entry.is_dir {
                (rel, format!("{}/", entry.name))
            } else {
                (rel.trim_end_matches(".md").to_string(), entry.name.clone())
            };
            html.push_str(&format!(
                "  <li><a href=\"{}\">{}</a></li>\n",
                escape_attr(&crate::utils::join_url(&self.prefix, &href)),
                escape_html(&display)
            ));
        }
        html.push_str("</ul>\n");

        let title = if req_path.is_empty() { "Wiki" } else { req_path };
        self.page(req_path, title, &html, None)
    }
}
