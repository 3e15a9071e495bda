use std::path::Path;
use time::OffsetDateTime;

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape HTML attribute values
pub fn escape_attr(text: &str) -> String {
    escape_html(text)
}

/// Join a mount prefix and a wiki-relative path into an absolute URL
pub fn join_url(prefix: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{path}"),
    }
}

/// Generate last modified metadata HTML
pub fn last_modified_html(path: &Path) -> String {
    let Some(secs) = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|mtime| mtime.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|dur| dur.as_secs() as i64)
    else {
        return String::new();
    };

    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|dt| dt.format(&time::format_description::well_known::Rfc3339).ok())
        .map(|s| format!("<p class=\"meta\">Last modified: {}</p>", escape_html(&s)))
        .unwrap_or_default()
}

/// Normalize request path
pub fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Parse a query parameter, decoding `+` and `%XX` escapes
pub fn parse_query_param(query: &str, param: &str) -> String {
    let query_string = query.trim_start_matches('?');
    for pair in query_string.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == param {
                return percent_decode(value);
            }
        }
    }
    String::new()
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_with_and_without_prefix() {
        assert_eq!(join_url("", ""), "/");
        assert_eq!(join_url("", "guide/intro"), "/guide/intro");
        assert_eq!(join_url("/wiki", ""), "/wiki");
        assert_eq!(join_url("/wiki", "/search"), "/wiki/search");
    }

    #[test]
    fn query_param_decoding() {
        assert_eq!(parse_query_param("?q=hello%20world", "q"), "hello world");
        assert_eq!(parse_query_param("a=1&q=rust+wiki", "q"), "rust wiki");
        assert_eq!(parse_query_param("q=%E2%9C%93", "q"), "✓");
        assert_eq!(parse_query_param("q=100%", "q"), "100%");
        assert_eq!(parse_query_param("x=1", "q"), "");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
