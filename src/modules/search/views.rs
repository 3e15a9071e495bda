use axum::{
    extract::{RawQuery, State},
    response::IntoResponse,
    routing::get,
    Extension,
};

use crate::app::RouteSet;
use crate::components::PageRenderer;
use crate::errors::WikiError;
use crate::types::{AppState, PageAssets, SearchResult};
use crate::utils::{escape_attr, escape_html, parse_query_param};

use super::run_query;

pub fn routes() -> RouteSet {
    RouteSet::new().route("/search", get(handle_search))
}

/// Handle search requests
pub async fn handle_search(
    State(state): State<AppState>,
    assets: Option<Extension<PageAssets>>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, WikiError> {
    let query = parse_query_param(&raw.unwrap_or_default(), "q");
    log::info!("Search request received for query: '{}'", query);
    let start_time = std::time::Instant::now();

    let results = run_query(&state, &query)?;
    let content = render_search_results(&state, &query, &results);

    let renderer = PageRenderer::new(&state, assets.map(|Extension(a)| a).unwrap_or_default());
    let page = renderer.page("", "Search", &content, None)?;

    log::info!("Search request completed in {}ms", start_time.elapsed().as_millis());
    Ok(page)
}

/// Render search results HTML
fn render_search_results(state: &AppState, query: &str, results: &[SearchResult]) -> String {
    let mut content = String::from("<div class=\"search-results\">");

    if query.trim().is_empty() {
        content.push_str("<p class=\"no-query\">Enter a search query to find content.</p></div>");
        return content;
    }

    content.push_str(&format!(
        "<h2 class=\"search-header\">Search Results for \"{}\"</h2>",
        escape_html(query)
    ));
    content.push_str(&format!(
        "<p class=\"results-count\">Found {} result{}</p>",
        results.len(),
        if results.len() == 1 { "" } else { "s" }
    ));

    if results.is_empty() {
        content.push_str("<p class=\"no-results\">No results found for your search.</p>");
    } else {
        content.push_str("<div class=\"search-results-list\">");
        for result in results {
            content.push_str(&format!(
                "<div class=\"search-result-item glass\">\
                 <h3 class=\"result-title\"><a href=\"{}\">{}</a></h3>\
                 <p class=\"result-path\"><code>{}</code></p>\
                 <p class=\"result-excerpt\">{}</p>\
                 <div class=\"result-meta\">Relevance: {:.1}</div></div>",
                escape_attr(&state.url(&result.path)),
                escape_html(&result.title),
                escape_html(&result.path),
                escape_html(&result.excerpt),
                result.relevance
            ));
        }
        content.push_str("</div>");
    }

    content.push_str("</div>");
    content
}
