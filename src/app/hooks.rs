//! Request lifecycle hooks contributed by modules
//!
//! `before_request` hooks run on every request in discovery order.
//! `before_first_request` hooks run once, before the first request the
//! process handles. Concurrent first requests wait on the gate; if a hook
//! fails the gate stays open and the next request resumes at that hook.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{debug, error, info};
use tokio::sync::Mutex;

use crate::errors::{Result, WikiError};
use crate::types::AppState;

pub type BeforeRequest = Arc<dyn Fn(&AppState, &mut Request) -> Result<()> + Send + Sync>;
pub type BeforeFirstRequest = Arc<dyn Fn(&AppState) -> Result<()> + Send + Sync>;

/// Hooks one module contributes; both slots are optional
#[derive(Default, Clone)]
pub struct HookSet {
    pub before_request: Option<BeforeRequest>,
    pub before_first_request: Option<BeforeFirstRequest>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AppState, &mut Request) -> Result<()> + Send + Sync + 'static,
    {
        self.before_request = Some(Arc::new(hook));
        self
    }

    pub fn before_first_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AppState) -> Result<()> + Send + Sync + 'static,
    {
        self.before_first_request = Some(Arc::new(hook));
        self
    }
}

/// Hooks collected during discovery, tagged with their module
#[derive(Default, Clone)]
pub struct HookRegistry {
    before_request: Vec<(String, BeforeRequest)>,
    before_first_request: Vec<(String, BeforeFirstRequest)>,
}

impl HookRegistry {
    pub fn register(&mut self, module: &str, hooks: HookSet) {
        if let Some(hook) = hooks.before_request {
            self.before_request.push((module.to_string(), hook));
        }
        if let Some(hook) = hooks.before_first_request {
            self.before_first_request.push((module.to_string(), hook));
        }
    }

    /// Modules with a `before_request` hook, in run order
    pub fn before_request_modules(&self) -> Vec<&str> {
        self.before_request.iter().map(|(m, _)| m.as_str()).collect()
    }

    /// Modules with a `before_first_request` hook, in run order
    pub fn before_first_request_modules(&self) -> Vec<&str> {
        self.before_first_request.iter().map(|(m, _)| m.as_str()).collect()
    }

    /// Freeze into the runtime form used by the middleware
    pub fn into_runner(self, state: AppState) -> Arc<RequestHooks> {
        Arc::new(RequestHooks {
            state,
            before_request: self.before_request,
            first: FirstRequestGate::new(self.before_first_request),
        })
    }
}

/// One-shot gate in front of the `before_first_request` hooks
pub struct FirstRequestGate {
    hooks: Vec<(String, BeforeFirstRequest)>,
    fired: AtomicBool,
    // index of the next hook to run
    cursor: Mutex<usize>,
}

impl FirstRequestGate {
    pub fn new(hooks: Vec<(String, BeforeFirstRequest)>) -> Self {
        let fired = AtomicBool::new(hooks.is_empty());
        Self { hooks, fired, cursor: Mutex::new(0) }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Run the remaining hooks unless a previous request already has
    pub async fn pass(&self, state: &AppState) -> Result<()> {
        if self.has_fired() {
            return Ok(());
        }

        let mut cursor = self.cursor.lock().await;
        if self.has_fired() {
            return Ok(());
        }

        while let Some((module, hook)) = self.hooks.get(*cursor) {
            debug!("Running before_first_request hook of '{}'", module);
            // hooks do blocking work (index builds), keep it off the workers
            let hook = Arc::clone(hook);
            let owned = state.clone();
            let outcome = tokio::task::spawn_blocking(move || hook(&owned))
                .await
                .unwrap_or_else(|e| {
                    Err(WikiError::Hook {
                        module: module.clone(),
                        message: format!("hook did not finish: {e}"),
                    })
                });
            if let Err(e) = outcome {
                error!("before_first_request hook of '{}' failed: {}", module, e);
                return Err(e);
            }
            *cursor += 1;
        }

        self.fired.store(true, Ordering::Release);
        info!("First request hooks completed ({})", self.hooks.len());
        Ok(())
    }
}

/// Runtime hook state shared by the request middleware
pub struct RequestHooks {
    state: AppState,
    before_request: Vec<(String, BeforeRequest)>,
    first: FirstRequestGate,
}

impl RequestHooks {
    /// Pass the first-request gate, then run every `before_request` hook
    pub async fn run(&self, request: &mut Request) -> Result<()> {
        self.first.pass(&self.state).await?;
        for (module, hook) in &self.before_request {
            hook(&self.state, request).map_err(|e| {
                error!("before_request hook of '{}' failed: {}", module, e);
                e
            })?;
        }
        Ok(())
    }
}

/// axum middleware wrapping every mounted route
pub async fn run_request_hooks(
    State(hooks): State<Arc<RequestHooks>>,
    mut request: Request,
    next: Next,
) -> Response {
    match hooks.run(&mut request).await {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::errors::WikiError;
    use std::sync::atomic::AtomicUsize;

    fn state() -> AppState {
        AppState::new(Config::new(), String::new())
    }

    fn counting(counter: &Arc<AtomicUsize>) -> BeforeFirstRequest {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &AppState| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn gate_fires_once_under_concurrency() {
        for n in [1usize, 2, 10] {
            let counter = Arc::new(AtomicUsize::new(0));
            let gate = Arc::new(FirstRequestGate::new(vec![("m".into(), counting(&counter))]));
            let state = state();

            let tasks: Vec<_> = (0..n)
                .map(|_| {
                    let gate = Arc::clone(&gate);
                    let state = state.clone();
                    tokio::spawn(async move { gate.pass(&state).await })
                })
                .collect();
            for task in tasks {
                task.await.unwrap().unwrap();
            }

            assert_eq!(counter.load(Ordering::SeqCst), 1, "n = {n}");
            assert!(gate.has_fired());
        }
    }

    #[tokio::test]
    async fn failed_hook_is_retried_without_rerunning_earlier_ones() {
        let first = Arc::new(AtomicUsize::new(0));
        let attempts = Arc::new(AtomicUsize::new(0));
        let flaky_attempts = Arc::clone(&attempts);
        let flaky: BeforeFirstRequest = Arc::new(move |_: &AppState| {
            if flaky_attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(WikiError::Hook { module: "flaky".into(), message: "not ready".into() })
            } else {
                Ok(())
            }
        });

        let gate = FirstRequestGate::new(vec![
            ("a".into(), counting(&first)),
            ("b".into(), flaky),
        ]);
        let state = state();

        assert!(gate.pass(&state).await.is_err());
        assert!(!gate.has_fired());
        gate.pass(&state).await.unwrap();
        gate.pass(&state).await.unwrap();

        assert!(gate.has_fired());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn first_request_hooks_run_off_the_calling_thread() {
        let caller = std::thread::current().id();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let record = Arc::clone(&seen);
        let hook: BeforeFirstRequest = Arc::new(move |_: &AppState| {
            *record.lock().unwrap() = Some(std::thread::current().id());
            Ok(())
        });

        let gate = FirstRequestGate::new(vec![("blocking".into(), hook)]);
        gate.pass(&state()).await.unwrap();
        let ran_on = seen.lock().unwrap().expect("hook ran");
        assert_ne!(ran_on, caller);
    }

    #[tokio::test]
    async fn panicking_hook_keeps_gate_open() {
        let hook: BeforeFirstRequest =
            Arc::new(|_: &AppState| -> Result<()> { panic!("index unavailable") });
        let gate = FirstRequestGate::new(vec![("broken".into(), hook)]);
        let err = gate.pass(&state()).await.unwrap_err();
        assert!(matches!(err, WikiError::Hook { ref module, .. } if module == "broken"));
        assert!(!gate.has_fired());
    }

    #[test]
    fn registry_keeps_discovery_order() {
        let mut registry = HookRegistry::default();
        registry.register("a", HookSet::new().before_request(|_, _| Ok(())));
        registry.register("b", HookSet::new());
        registry.register(
            "c",
            HookSet::new()
                .before_request(|_, _| Ok(()))
                .before_first_request(|_| Ok(())),
        );
        assert_eq!(registry.before_request_modules(), vec!["a", "c"]);
        assert_eq!(registry.before_first_request_modules(), vec!["c"]);
    }
}
