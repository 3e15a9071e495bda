use std::fs;
use std::path::Path;

use crate::errors::WikiError;
use crate::types::{PageAssets, TemplateContext};
use crate::utils::{escape_attr, escape_html, join_url};

/// Renders pages into the HTML shell, `static/html/base.html` when present
pub struct TemplateComponent {
    base_template: Option<String>,
    prefix: String,
}

impl TemplateComponent {
    /// Load the shell template from the static directory, if there is one
    pub fn new(static_dir: &Path, prefix: &str) -> Self {
        let base_template = fs::read_to_string(static_dir.join("html").join("base.html")).ok();
        Self { base_template, prefix: prefix.to_string() }
    }

    /// Load and render the main HTML shell template
    pub fn render_shell_template(&self, context: &TemplateContext) -> Result<String, WikiError> {
        let title = escape_html(&context.title);
        let style = self.asset_tags(&context.assets);
        let sidebar = match &context.toc {
            Some(toc) if !context.sidebar.contains(toc.as_str()) => format!("{}{}", context.sidebar, toc),
            _ => context.sidebar.clone(),
        };

        if let Some(base) = &self.base_template {
            return Ok(base
                .replace("{{TITLE}}", &title)
                .replace("{{STYLE}}", &style)
                .replace("{{SIDEBAR}}", &sidebar)
                .replace("{{CONTENT}}", &context.content)
                .replace("{{FAB}}", &context.fab));
        }

        Ok(format!(
            "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
             <title>{title}</title>{style}</head><body><a id=\"top\"></a><div class=\"layout\">\
             <aside class=\"sidebar glass\">{sidebar}</aside><main class=\"content\">\
             <div class=\"article-card glass\">{}</div></main></div>\
             <a class=\"back-to-top glass\" href=\"#top\" aria-label=\"Back to top\">↑</a>{}</body></html>",
            context.content, context.fab
        ))
    }

    /// Generate a complete page with navigation and content
    pub fn render_page(
        &self,
        navigation: &str,
        content: &str,
        fab: &str,
        title: &str,
        toc: Option<&str>,
        assets: &PageAssets,
    ) -> Result<String, WikiError> {
        let context = TemplateContext {
            title: title.to_string(),
            content: content.to_string(),
            sidebar: navigation.to_string(),
            fab: fab.to_string(),
            toc: toc.map(str::to_string),
            assets: assets.clone(),
        };
        self.render_shell_template(&context)
    }

    fn asset_tags(&self, assets: &PageAssets) -> String {
        let mut tags = String::new();
        for css in &assets.css {
            let href = join_url(&self.prefix, &format!("static/{css}"));
            tags.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">", escape_attr(&href)));
        }
        for js in &assets.js {
            let src = join_url(&self.prefix, &format!("static/{js}"));
            tags.push_str(&format!("<script src=\"{}\" defer></script>", escape_attr(&src)));
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_shell_includes_assets() {
        let dir = tempfile::tempdir().unwrap();
        let templates = TemplateComponent::new(dir.path(), "/wiki");
        let page = templates
            .render_page("<nav/>", "<p>hi</p>", "", "A <b>", None, &PageAssets::default())
            .unwrap();
        assert!(page.contains("<title>A &lt;b&gt;</title>"));
        assert!(page.contains("href=\"/wiki/static/css/realms.css\""));
        assert!(page.contains("src=\"/wiki/static/js/realms.js\""));
        assert!(page.contains("<p>hi</p>"));
    }

    #[test]
    fn base_template_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("html")).unwrap();
        fs::write(dir.path().join("html/base.html"), "[{{TITLE}}]{{CONTENT}}").unwrap();
        let templates = TemplateComponent::new(dir.path(), "");
        let page = templates
            .render_page("", "body", "", "T", None, &PageAssets::default())
            .unwrap();
        assert_eq!(page, "[T]body");
    }
}
