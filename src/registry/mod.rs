//! Module registry and discovery
//!
//! Modules are known at compile time. Each registers a factory under its
//! identifier; the configured `modules` list picks which ones are wired into
//! the [`AppContext`] and in what order.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::app::{AppContext, CommandSet, HookSet, RouteSet};
use crate::config::Config;
use crate::errors::{Result, WikiError};

/// Module setup run before any of its other capabilities are wired
pub type Initializer = Box<dyn FnOnce(&mut AppContext) -> Result<()> + Send>;

/// Builds a module's descriptor from configuration
pub type ModuleFactory = Arc<dyn Fn(&Config) -> ModuleDescriptor + Send + Sync>;

/// What a module contributes; every capability is optional
#[derive(Default)]
pub struct ModuleDescriptor {
    name: String,
    pub init: Option<Initializer>,
    pub views: Option<RouteSet>,
    pub commands: Option<CommandSet>,
    pub hooks: Option<HookSet>,
}

impl ModuleDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the module was resolved under
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: FnOnce(&mut AppContext) -> Result<()> + Send + 'static,
    {
        self.init = Some(Box::new(init));
        self
    }

    pub fn with_views(mut self, views: RouteSet) -> Self {
        self.views = Some(views);
        self
    }

    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

/// Statically known modules, keyed by identifier
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every module shipped with the crate
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register("wiki", crate::modules::wiki::descriptor)
            .register("search", crate::modules::search::descriptor);
        registry
    }

    /// Register (or replace) the factory for `name`
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&Config) -> ModuleDescriptor + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the descriptor for `name`
    pub fn resolve(&self, name: &str, config: &Config) -> Result<ModuleDescriptor> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| WikiError::UnknownModule(name.to_string()))?;
        let mut descriptor = factory(config);
        descriptor.name = name.to_string();
        Ok(descriptor)
    }
}

/// Resolve `names` and wire each module into `ctx`, in order.
///
/// Every name is resolved before anything is wired, so an unknown or
/// repeated name leaves the context untouched. Per module the order is
/// initializer, routes, commands, hooks. The first error aborts discovery.
pub fn discover<S: AsRef<str>>(ctx: &mut AppContext, registry: &ModuleRegistry, names: &[S]) -> Result<()> {
    let start = Instant::now();
    ctx.begin_discovery()?;

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref();
        if !seen.insert(name) {
            return Err(WikiError::Config(format!("module '{name}' is listed more than once")));
        }
        resolved.push(registry.resolve(name, ctx.config())?);
    }

    for descriptor in resolved {
        wire(ctx, descriptor)?;
    }

    info!(
        "Discovered {} modules [{}] in {:.2}ms",
        ctx.modules().len(),
        ctx.modules().join(", "),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

fn wire(ctx: &mut AppContext, descriptor: ModuleDescriptor) -> Result<()> {
    let ModuleDescriptor { name, init, views, commands, hooks } = descriptor;
    debug!("Wiring module '{}'", name);

    if let Some(init) = init {
        init(ctx).map_err(|e| WikiError::ModuleInit { module: name.clone(), source: Box::new(e) })?;
    }

    if let Some(views) = views {
        debug!("Mounting {} routes of '{}' under '{}'", views.paths().len(), name, ctx.url_prefix());
        ctx.mount_routes(&name, views)?;
    }

    if let Some(commands) = commands {
        let group = ctx.add_commands(&name, commands)?;
        debug!("Registered command group '{}' for '{}'", group, name);
    }

    if let Some(hooks) = hooks {
        ctx.register_hooks(&name, hooks);
    }

    ctx.record_module(&name);
    Ok(())
}
