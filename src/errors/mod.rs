use std::io;

use axum::{http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, WikiError>;

/// Custom error types for the wiki application
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Not found")]
    NotFound,

    #[error("Invalid path")]
    InvalidPath,

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configured module name has no entry in the registry
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    /// A module initializer failed during discovery
    #[error("module '{module}' failed to initialize: {source}")]
    ModuleInit {
        module: String,
        #[source]
        source: Box<WikiError>,
    },

    /// Two modules declared the same full route path
    #[error("route '{path}' from module '{module}' is already mounted by '{owner}'")]
    RouteCollision {
        path: String,
        module: String,
        owner: String,
    },

    /// A command group name is taken
    #[error("command '{0}' is already registered")]
    CommandCollision(String),

    #[error("modules have already been discovered for this application")]
    AlreadyDiscovered,

    /// A lifecycle hook refused a request
    #[error("hook from module '{module}' failed: {message}")]
    Hook { module: String, message: String },

    #[error("Command error: {0}")]
    Command(String),
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        let status = match &self {
            WikiError::NotFound => StatusCode::NOT_FOUND,
            WikiError::InvalidPath => StatusCode::BAD_REQUEST,
            WikiError::Hook { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(WikiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(WikiError::InvalidPath.into_response().status(), StatusCode::BAD_REQUEST);
        let hook = WikiError::Hook { module: "search".into(), message: "index".into() };
        assert_eq!(hook.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        let render = WikiError::RenderError("boom".into());
        assert_eq!(render.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn module_init_keeps_source() {
        let err = WikiError::ModuleInit {
            module: "wiki".into(),
            source: Box::new(WikiError::InvalidPath),
        };
        assert_eq!(err.to_string(), "module 'wiki' failed to initialize: Invalid path");
        assert!(std::error::Error::source(&err).is_some());
    }
}
