//! Full-text search over wiki pages

pub mod commands;
pub mod views;

use log::{info, warn};

use crate::app::HookSet;
use crate::config::{Config, SearchType};
use crate::errors::Result;
use crate::registry::ModuleDescriptor;
use crate::services::search_service::clamp_query;
use crate::services::{FileService, SearchService};
use crate::types::{AppState, SearchResult};

pub fn descriptor(config: &Config) -> ModuleDescriptor {
    let mut hooks = HookSet::new();
    if config.search_type == SearchType::Index {
        hooks = hooks.before_first_request(|state| warm_index(state).map(|_| ()));
    }

    ModuleDescriptor::new()
        .with_init(|ctx| {
            info!("Search backend: {:?}", ctx.config().search_type);
            ctx.state().search_index.clear();
            Ok(())
        })
        .with_views(views::routes())
        .with_commands(commands::cli())
        .with_hooks(hooks)
}

/// Fill the in-memory index from its file, rebuilding and storing it when
/// the file is missing or unreadable
pub fn warm_index(state: &AppState) -> Result<usize> {
    let file = state.config.search_index_file();
    if file.is_file() {
        match state.search_index.load(&file) {
            Ok(count) => return Ok(count),
            Err(e) => warn!("Ignoring stored index {:?}: {}", file, e),
        }
    }
    rebuild_index(state)
}

/// Re-read every page and persist the result
pub fn rebuild_index(state: &AppState) -> Result<usize> {
    let count = state
        .search_index
        .rebuild(&FileService::new(state.base_dir.as_ref().clone()))?;
    state.search_index.save(&state.config.search_index_file())?;
    Ok(count)
}

/// Run a query against the configured backend
pub fn run_query(state: &AppState, query: &str) -> Result<Vec<SearchResult>> {
    let query = clamp_query(query);
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    match state.config.search_type {
        SearchType::Simple => {
            SearchService::new(FileService::new(state.base_dir.as_ref().clone())).search(query)
        }
        SearchType::Index => state.search_index.search(query),
    }
}
