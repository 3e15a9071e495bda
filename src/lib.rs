//! Realms - a file based wiki assembled from pluggable modules
//!
//! Modules are registered in a [`ModuleRegistry`]; [`discover`] wires the
//! configured ones into an [`AppContext`], which then serves HTTP and
//! exposes each module's CLI commands.

pub mod app;
pub mod cli;
pub mod components;
pub mod config;
pub mod errors;
pub mod logger;
pub mod modules;
pub mod registry;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use app::{AppContext, CommandSet, HookSet, HostMode, RouteSet};
pub use config::{Config, SearchType};
pub use errors::{Result, WikiError};
pub use registry::{discover, ModuleDescriptor, ModuleRegistry};
pub use types::{AppState, PageAssets, SearchResult};
