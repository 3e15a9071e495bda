//! Shared test utilities

#![allow(dead_code)]

use std::fmt::Debug;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use realms::Config;
use tempfile::TempDir;
use tower::{Service, ServiceExt};

/// A wiki directory with a couple of pages
pub fn wiki_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let wiki = dir.path().join("wiki");
    std::fs::create_dir_all(wiki.join("guide")).unwrap();
    std::fs::write(wiki.join("index.md"), "# Home\n\nWelcome to the wiki.").unwrap();
    std::fs::write(wiki.join("page.md"), "# Page Title\n\nRust powered pages.").unwrap();
    std::fs::write(wiki.join("guide/intro.md"), "# Intro\n\nGetting started with rust.").unwrap();
    dir
}

/// Configuration pointing at a [`wiki_dir`]
pub fn config_for(dir: &TempDir) -> Config {
    let mut config = Config::new();
    config.wiki_path = dir.path().join("wiki");
    config.static_path = dir.path().join("static");
    config.relative_path = "/wiki".to_string();
    config
}

/// Issue a GET against a router (or the full service) and return status
/// plus body text
pub async fn get<S>(service: S, uri: &str) -> (StatusCode, String)
where
    S: Service<Request<Body>, Response = Response>,
    S::Error: Debug,
{
    let response = service
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
