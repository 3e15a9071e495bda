use axum::routing::MethodRouter;
use axum::Router;

use crate::errors::{Result, WikiError};
use crate::types::AppState;
use crate::utils::join_url;

/// Routes contributed by one module, with the paths they declare
pub struct RouteSet {
    router: Router<AppState>,
    paths: Vec<String>,
}

impl RouteSet {
    pub fn new() -> Self {
        Self { router: Router::new(), paths: Vec::new() }
    }

    /// Add a route, recording its path for the route table
    pub fn route(mut self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.paths.push(path.to_string());
        self.router = self.router.route(path, method_router);
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl Default for RouteSet {
    fn default() -> Self {
        Self::new()
    }
}

/// One mounted route: its full path and the module that owns it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MountedRoute {
    pub path: String,
    pub module: String,
}

/// Merged routes of every discovered module, all under one prefix
pub struct RouteTable {
    prefix: String,
    router: Router<AppState>,
    mounted: Vec<MountedRoute>,
}

impl RouteTable {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_string(), router: Router::new(), mounted: Vec::new() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Merge a module's routes; a path that conflicts with one already
    /// mounted is fatal and leaves the table untouched
    pub fn mount(&mut self, module: &str, set: RouteSet) -> Result<()> {
        let mut incoming: Vec<MountedRoute> = Vec::with_capacity(set.paths.len());
        for path in &set.paths {
            let full = join_url(&self.prefix, path);
            if let Some(owner) = self
                .mounted
                .iter()
                .chain(incoming.iter())
                .find(|m| routes_conflict(&m.path, &full))
            {
                return Err(WikiError::RouteCollision {
                    path: full,
                    module: module.to_string(),
                    owner: owner.module.clone(),
                });
            }
            incoming.push(MountedRoute { path: full, module: module.to_string() });
        }

        self.router = std::mem::take(&mut self.router).merge(set.router);
        self.mounted.extend(incoming);
        Ok(())
    }

    /// Mounted routes in mount order
    pub fn mounted(&self) -> &[MountedRoute] {
        &self.mounted
    }

    /// Whether no route has been mounted yet
    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// The merged router, nested under the prefix when there is one
    pub fn router(&self) -> Router<AppState> {
        if self.prefix.is_empty() || self.mounted.is_empty() {
            self.router.clone()
        } else {
            Router::new().nest(&self.prefix, self.router.clone())
        }
    }
}

/// Shape of a route pattern with capture names erased
/// (`/page/:id/*rest` becomes `/page/:_/*_`)
pub fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.chars().next() {
            Some(':') => ":_",
            Some('*') => "*_",
            _ => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether two patterns cannot live in the same router.
///
/// Equal shapes always conflict. Past that the router accepts a static
/// segment beside a capture, but not two captures with different names in
/// the same position, nor a catch-all beside another capture.
pub fn routes_conflict(a: &str, b: &str) -> bool {
    if route_shape(a) == route_shape(b) {
        return true;
    }

    let mut left = a.trim_start_matches('/').split('/');
    let mut right = b.trim_start_matches('/').split('/');
    loop {
        let (x, y) = match (left.next(), right.next()) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };
        match (x.chars().next(), y.chars().next()) {
            (Some('*'), Some('*' | ':')) | (Some(':'), Some('*')) => return true,
            (Some(':'), Some(':')) if x != y => return true,
            (Some(':'), Some(':')) => continue,
            (Some(':' | '*'), _) | (_, Some(':' | '*')) => return false,
            _ if x == y => continue,
            _ => return false,
        }
    }
}
