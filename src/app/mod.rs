//! Application context: everything discovery contributes, plus serving

pub mod client;
pub mod commands;
pub mod hooks;
pub mod routes;

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::extract::Request;
use axum::response::Redirect;
use axum::routing::get;
use axum::{middleware, Router, ServiceExt};
use log::info;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::config::Config;
use crate::errors::{Result, WikiError};
use crate::types::AppState;

pub use client::ClientAddr;
pub use commands::{CommandSet, CommandTree};
pub use hooks::{HookRegistry, HookSet, RequestHooks};
pub use routes::{MountedRoute, RouteSet, RouteTable};

/// Environment variable a hosting process sets when it embeds the wiki
pub const EMBEDDED_ENV: &str = "REALMS_EMBEDDED";

static HOST_MODE: OnceLock<HostMode> = OnceLock::new();

/// How the process is hosted; decides the URL prefix of module routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    /// Own listener; routes live under the configured relative path
    Standalone,
    /// Mounted by a host that owns the URL space; routes live at the root
    Embedded,
}

impl HostMode {
    /// Detect the mode once per process
    pub fn detect() -> HostMode {
        *HOST_MODE.get_or_init(|| {
            let mode = Self::from_env_value(std::env::var(EMBEDDED_ENV).ok().as_deref());
            info!("Host mode: {:?}", mode);
            mode
        })
    }

    fn from_env_value(value: Option<&str>) -> HostMode {
        match value.map(str::trim) {
            None | Some("") | Some("0") => HostMode::Standalone,
            Some(v) if v.eq_ignore_ascii_case("false") => HostMode::Standalone,
            Some(_) => HostMode::Embedded,
        }
    }

    /// Prefix module routes are mounted under
    pub fn url_prefix(self, config: &Config) -> String {
        match self {
            HostMode::Embedded => String::new(),
            HostMode::Standalone => config.mount_prefix(),
        }
    }
}

/// Process-wide application state accumulated during discovery
pub struct AppContext {
    state: AppState,
    host_mode: HostMode,
    routes: RouteTable,
    commands: CommandTree,
    hooks: HookRegistry,
    // frozen on first use so every router shares one first-request gate
    runner: OnceLock<Arc<RequestHooks>>,
    modules: Vec<String>,
    discovered: bool,
}

impl AppContext {
    pub fn new(config: Config, host_mode: HostMode) -> Self {
        let prefix = host_mode.url_prefix(&config);
        Self {
            routes: RouteTable::new(&prefix),
            state: AppState::new(config, prefix),
            host_mode,
            commands: CommandTree::new(),
            hooks: HookRegistry::default(),
            runner: OnceLock::new(),
            modules: Vec::new(),
            discovered: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn host_mode(&self) -> HostMode {
        self.host_mode
    }

    pub fn url_prefix(&self) -> &str {
        self.routes.prefix()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn commands(&self) -> &CommandTree {
        &self.commands
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Discovered modules in discovery order
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn mount_routes(&mut self, module: &str, routes: RouteSet) -> Result<()> {
        self.routes.mount(module, routes)
    }

    pub fn add_commands(&mut self, module: &str, commands: CommandSet) -> Result<String> {
        self.commands.merge(module, commands)
    }

    pub fn register_hooks(&mut self, module: &str, hooks: HookSet) {
        self.hooks.register(module, hooks);
    }

    pub(crate) fn begin_discovery(&mut self) -> Result<()> {
        if self.discovered {
            return Err(WikiError::AlreadyDiscovered);
        }
        self.discovered = true;
        Ok(())
    }

    pub(crate) fn record_module(&mut self, module: &str) {
        self.modules.push(module.to_string());
    }

    /// Hook runner shared by every router built from this context.
    ///
    /// Hooks registered after the first call are not picked up.
    pub fn request_hooks(&self) -> Arc<RequestHooks> {
        Arc::clone(
            self.runner
                .get_or_init(|| self.hooks.clone().into_runner(self.state.clone())),
        )
    }

    /// Router serving every mounted module behind the lifecycle hooks
    pub fn build_router(&self) -> Router {
        let prefix = self.url_prefix().to_string();
        let runner = self.request_hooks();

        let mut router = self.routes.router();
        if !prefix.is_empty() {
            router = router.route(
                "/",
                get(move || {
                    let target = prefix.clone();
                    async move { Redirect::to(&target) }
                }),
            );
        }

        router
            .layer(middleware::from_fn_with_state(runner, hooks::run_request_hooks))
            .layer(middleware::from_fn(client::resolve_client_addr))
            .with_state(self.state.clone())
    }

    /// The service the listener runs: the router with trailing slashes
    /// trimmed before routing
    pub fn service(&self) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(self.build_router())
    }
}

/// Bind the configured address and serve until the process is stopped
pub async fn serve(ctx: &AppContext, port_override: Option<u16>) -> Result<()> {
    let mut addr = ctx.config().socket_addr()?;
    if let Some(port) = port_override {
        addr.set_port(port);
    }

    let app = ctx.service();

    let listener = TcpListener::bind(addr).await?;
    info!(
        "Wiki listening on http://{}{} ({} modules)",
        addr,
        ctx.url_prefix(),
        ctx.modules().len()
    );
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;
    Ok(())
}
