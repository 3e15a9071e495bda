use std::collections::HashMap;

use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::errors::WikiError;
use crate::types::MarkdownResult;
use crate::utils::{escape_attr, escape_html};

/// (level, anchor id, text)
type Heading = (u32, String, String);

/// Service for handling markdown rendering
pub struct MarkdownService {
    options: Options,
}

impl MarkdownService {
    /// Create a new markdown service
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }

    /// Render markdown with heading anchors and a table of contents
    pub fn render_with_toc(&self, content: &str) -> Result<MarkdownResult, WikiError> {
        let (front_title, body) = split_front_matter(content);
        let headings = self.collect_headings(body);

        let mut out = String::with_capacity(body.len() * 2);
        let mut next_heading = headings.iter();
        let mut open: Vec<(u32, String)> = Vec::new();

        for event in Parser::new_ext(body, self.options) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    let lvl = heading_level(level);
                    let id = next_heading
                        .next()
                        .map(|(_, id, _)| id.clone())
                        .unwrap_or_default();
                    out.push_str(&format!("<h{} id=\"{}\">", lvl, escape_attr(&id)));
                    open.push((lvl, id));
                }
                Event::End(TagEnd::Heading(level)) => {
                    let (lvl, id) = open
                        .pop()
                        .ok_or_else(|| WikiError::RenderError("unbalanced heading".to_string()))?;
                    debug_assert_eq!(lvl, heading_level(level));
                    out.push_str(&format!(
                        "<a class=\"hlink\" href=\"#{}\" aria-label=\"Link to this section\">#</a></h{}>",
                        escape_attr(&id),
                        lvl
                    ));
                }
                other => html::push_html(&mut out, std::iter::once(other)),
            }
        }

        let title = front_title.or_else(|| {
            headings
                .iter()
                .find(|(lvl, _, text)| *lvl == 1 && !text.trim().is_empty())
                .map(|(_, _, text)| text.clone())
        });

        Ok(MarkdownResult {
            html: out,
            toc: build_toc_html(&headings),
            title,
        })
    }

    /// Plain text of a document, front matter stripped; used for indexing
    pub fn plain_text(&self, content: &str) -> String {
        let (_, body) = split_front_matter(content);
        let mut text = String::with_capacity(body.len());
        for event in Parser::new_ext(body, self.options) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak
                | Event::HardBreak
                | Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock) => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    fn collect_headings(&self, body: &str) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut current: Option<u32> = None;
        let mut buf = String::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for event in Parser::new_ext(body, self.options) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some(heading_level(level));
                    buf.clear();
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(lvl) = current.take() {
                        let mut id = slugify(&buf);
                        if id.is_empty() {
                            id = format!("h{lvl}");
                        }
                        let count = seen.entry(id.clone()).or_insert(0);
                        if *count > 0 {
                            id = format!("{}-{}", id, count);
                        }
                        *count += 1;
                        headings.push((lvl, id, buf.clone()));
                    }
                }
                Event::Text(t) | Event::Code(t) if current.is_some() => buf.push_str(&t),
                Event::SoftBreak | Event::HardBreak if current.is_some() => buf.push(' '),
                _ => {}
            }
        }
        headings
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

fn build_toc_html(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }
    let mut html = String::from("<nav class=\"toc\"><div class=\"toc-title\">Contents</div>");
    let mut depth = 0u32;
    for (level, id, title) in headings {
        while depth < *level {
            html.push_str("<ul>");
            depth += 1;
        }
        while depth > *level {
            html.push_str("</ul>");
            depth -= 1;
        }
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>",
            escape_attr(id),
            escape_html(title)
        ));
    }
    while depth > 0 {
        html.push_str("</ul>");
        depth -= 1;
    }
    html.push_str("</nav>");
    html
}

fn heading_level(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// URL-friendly anchor for a heading
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if (c.is_ascii_whitespace() || c == '-' || c == '_') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

/// Split `---` front matter off a document, returning its `title:` if any
pub fn split_front_matter(raw: &str) -> (Option<String>, &str) {
    let Some(rest) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
        return (None, raw);
    };

    let mut title = None;
    let mut offset = raw.len() - rest.len();
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let trimmed = line.trim();
        if trimmed == "---" {
            return (title, &raw[offset..]);
        }
        if let Some((key, value)) = trimmed.split_once(':') {
            if key.trim().eq_ignore_ascii_case("title") {
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if !value.is_empty() {
                    title = Some(value.to_string());
                }
            }
        }
    }
    // unterminated front matter is treated as content
    (None, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_get_unique_anchors_and_toc() {
        let md = "# Intro\n\ntext\n\n## Setup\n\n## Setup\n";
        let result = MarkdownService::new().render_with_toc(md).unwrap();
        assert!(result.html.contains("<h1 id=\"intro\">"));
        assert!(result.html.contains("<h2 id=\"setup\">"));
        assert!(result.html.contains("<h2 id=\"setup-1\">"));
        assert!(result.toc.contains("href=\"#setup-1\""));
        assert_eq!(result.title.as_deref(), Some("Intro"));
    }

    #[test]
    fn front_matter_title_wins() {
        let md = "---\ntitle: \"Home Page\"\ntags: x\n---\n# Welcome\n";
        let result = MarkdownService::new().render_with_toc(md).unwrap();
        assert_eq!(result.title.as_deref(), Some("Home Page"));
        assert!(!result.html.contains("tags"));
    }

    #[test]
    fn unterminated_front_matter_is_content() {
        let (title, body) = split_front_matter("---\ntitle: x\nno end");
        assert!(title.is_none());
        assert!(body.starts_with("---"));
    }

    #[test]
    fn no_headings_no_toc() {
        let result = MarkdownService::new().render_with_toc("just text").unwrap();
        assert!(result.toc.is_empty());
        assert!(result.title.is_none());
        assert!(result.html.contains("<p>just text</p>"));
    }

    #[test]
    fn plain_text_drops_markup() {
        let text = MarkdownService::new().plain_text("# Title\n\nSome **bold** `code`");
        assert!(text.contains("Title"));
        assert!(text.contains("Some bold code"));
        assert!(!text.contains("**"));
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  a__b  "), "a-b");
    }
}
