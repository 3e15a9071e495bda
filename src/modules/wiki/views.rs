use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderValue, Response},
    response::IntoResponse,
    routing::get,
    Extension,
};

use crate::app::RouteSet;
use crate::components::PageRenderer;
use crate::errors::WikiError;
use crate::services::file_service::is_markdown;
use crate::services::FileService;
use crate::types::{AppState, PageAssets};
use crate::utils::{escape_attr, escape_html, join_url, normalize_path};

const INDEX_FILES: [&str; 2] = ["index.md", "README.md"];

pub fn routes() -> RouteSet {
    RouteSet::new()
        .route("/", get(handle_root))
        .route("/raw/*path", get(handle_raw))
        .route("/static/*path", get(handle_static))
        .route("/*path", get(handle_path))
}

fn assets_of(assets: Option<Extension<PageAssets>>) -> PageAssets {
    assets.map(|Extension(a)| a).unwrap_or_default()
}

/// Handle root path requests
pub async fn handle_root(
    State(state): State<AppState>,
    assets: Option<Extension<PageAssets>>,
) -> Result<impl IntoResponse, WikiError> {
    let renderer = PageRenderer::new(&state, assets_of(assets));
    directory_page(&renderer, "")
}

/// Handle page, directory and file requests
pub async fn handle_path(
    State(state): State<AppState>,
    assets: Option<Extension<PageAssets>>,
    AxumPath(path): AxumPath<String>,
) -> Result<Response<Body>, WikiError> {
    log::info!("Path request received: '{}'", path);

    let normalized = normalize_path(&path);
    let renderer = PageRenderer::new(&state, assets_of(assets));
    let requested = renderer.files().resolve(Path::new(&normalized))?;

    if requested.is_dir() {
        return Ok(directory_page(&renderer, &normalized)?.into_response());
    }

    if requested.is_file() {
        if is_markdown(&requested) {
            return Ok(renderer.markdown(Path::new(&normalized), &normalized)?.into_response());
        }
        return serve_file(renderer.files(), &requested);
    }

    let md_variant = PathBuf::from(format!("{normalized}.md"));
    if renderer.files().resolve(&md_variant)?.is_file() {
        log::debug!("Serving .md variant for '{}'", normalized);
        return Ok(renderer.markdown(&md_variant, &normalized)?.into_response());
    }

    log::warn!("Path not found: '{}'", normalized);
    Err(WikiError::NotFound)
}

/// Handle raw markdown requests
pub async fn handle_raw(
    State(state): State<AppState>,
    assets: Option<Extension<PageAssets>>,
    AxumPath(path): AxumPath<String>,
) -> Result<impl IntoResponse, WikiError> {
    let normalized = normalize_path(&path);
    let renderer = PageRenderer::new(&state, assets_of(assets));

    let file = if is_markdown(Path::new(&normalized)) {
        PathBuf::from(&normalized)
    } else {
        PathBuf::from(format!("{normalized}.md"))
    };
    let content = renderer.files().read_file(&file)?;
    let page_path = normalized.trim_end_matches(".md");

    let body = format!(
        "<div class=\"raw-viewer\"><div class=\"raw-header\"><h1>Raw Markdown: {}</h1>\
         <a href=\"{}\" class=\"raw-btn primary\">← Back to Rendered View</a></div>\
         <pre class=\"raw-markdown\"><code>{}</code></pre></div>",
        escape_html(&file.to_string_lossy()),
        escape_attr(&join_url(&state.url_prefix, page_path)),
        escape_html(&content)
    );
    renderer.page(page_path, &format!("Raw: {page_path}"), &body, None)
}

/// Handle static file requests
pub async fn handle_static(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> Result<Response<Body>, WikiError> {
    let files = FileService::new(state.static_dir.as_ref().clone());
    let requested = files.resolve(Path::new(&normalize_path(&path)))?;
    if !requested.is_file() {
        return Err(WikiError::NotFound);
    }
    serve_file(&files, &requested)
}

/// index.md or README.md when the directory has one, else a listing
fn directory_page(renderer: &PageRenderer, dir: &str) -> Result<axum::response::Html<String>, WikiError> {
    for name in INDEX_FILES {
        let candidate = Path::new(dir).join(name);
        if renderer.files().resolve(&candidate)?.is_file() {
            log::debug!("Serving {} for directory '{}'", name, dir);
            return renderer.markdown(&candidate, dir);
        }
    }
    renderer.listing(dir)
}

fn serve_file(files: &FileService, path: &Path) -> Result<Response<Body>, WikiError> {
    let bytes = std::fs::read(path)?;
    let mut resp = Response::new(Body::from(bytes));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(files.content_type_for(path)),
    );
    Ok(resp)
}
