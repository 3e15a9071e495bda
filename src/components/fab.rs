use log::debug;

use crate::utils::{escape_attr, join_url};

/// Floating action bar: home link, search box and per-page actions
pub struct FabComponent {
    prefix: String,
}

/// Represents a FAB action button
pub struct FabAction {
    pub href: String,
    pub title: String,
    pub class: String,
}

impl FabComponent {
    /// Create a FAB whose links live under `prefix`
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_string() }
    }

    /// Generate FAB actions for a given page path
    pub fn generate_actions(&self, path: &str) -> Vec<FabAction> {
        if path.is_empty() {
            return Vec::new();
        }
        vec![FabAction {
            href: join_url(&self.prefix, &format!("raw/{path}")),
            title: "View raw markdown".to_string(),
            class: "fab-action-raw".to_string(),
        }]
    }

    /// Generate complete FAB HTML; the home page gets the `fab-home` variant
    pub fn generate_fab_html(&self, path: &str, actions: &[FabAction]) -> String {
        debug!("Generating FAB HTML for path: '{}' with {} actions", path, actions.len());
        let fab_class = if path.is_empty() { "fab-home" } else { "fab-page" };

        let mut html = format!("<div class=\"fab glass {fab_class}\" id=\"fab\"><div class=\"fab-menu\">");
        html.push_str(&format!(
            "<a href=\"{}\" class=\"fab-item\" title=\"Home\"></a>",
            escape_attr(&join_url(&self.prefix, ""))
        ));
        html.push_str(&format!(
            "<div class=\"fab-search\"><form action=\"{}\" method=\"get\">\
             <input type=\"text\" name=\"q\" placeholder=\"Search...\"></form></div>",
            escape_attr(&join_url(&self.prefix, "search"))
        ));

        if !actions.is_empty() {
            html.push_str("<div class=\"fab-actions\">");
            for action in actions {
                html.push_str(&format!(
                    "<a href=\"{}\" title=\"{}\" class=\"{}\"></a>",
                    escape_attr(&action.href),
                    escape_attr(&action.title),
                    action.class
                ));
            }
            html.push_str("</div>");
        }

        html.push_str("</div></div>");
        html
    }
}
