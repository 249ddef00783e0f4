//! Lazy, once-per-session bootstrap of a managed runtime.
//!
//! The bootstrapper is a small state machine:
//!
//! ```text
//! Uninitialized -> Loading -> Ready
//!                          -> Failed -> (next call) Loading -> ...
//! ```
//!
//! While `Loading`, the single in-flight load is stored as a shared future.
//! Every caller that arrives in the meantime awaits that same future, so the
//! loader script is fetched and initialized exactly once no matter how many
//! runs are triggered concurrently. A failure is reported to all of those
//! callers; the next call after that starts a fresh attempt.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use super::{ManagedRuntime, RuntimeLoader};
use crate::config::RuntimeConfig;
use crate::errors::EnvironmentLoadError;

type LoadOutcome<R> = Result<Arc<R>, EnvironmentLoadError>;
type PendingLoad<R> = Shared<BoxFuture<'static, LoadOutcome<R>>>;

enum BootState<R> {
    Uninitialized,
    Loading(PendingLoad<R>),
    Ready(Arc<R>),
    Failed(EnvironmentLoadError),
}

/// Observable bootstrap state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootPhase {
    Uninitialized,
    Loading,
    Ready,
    Failed(EnvironmentLoadError),
}

pub struct Bootstrapper<L: RuntimeLoader> {
    loader: Arc<L>,
    config: RuntimeConfig,
    state: Mutex<BootState<L::Runtime>>,
}

impl<L: RuntimeLoader> Bootstrapper<L> {
    pub fn new(loader: L, config: RuntimeConfig) -> Self {
        Self {
            loader: Arc::new(loader),
            config,
            state: Mutex::new(BootState::Uninitialized),
        }
    }

    pub fn phase(&self) -> BootPhase {
        match &*self.state() {
            BootState::Uninitialized => BootPhase::Uninitialized,
            BootState::Loading(_) => BootPhase::Loading,
            BootState::Ready(_) => BootPhase::Ready,
            BootState::Failed(err) => BootPhase::Failed(err.clone()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state(), BootState::Ready(_))
    }

    /// The cached runtime, without triggering a load.
    pub fn handle(&self) -> Option<Arc<L::Runtime>> {
        match &*self.state() {
            BootState::Ready(runtime) => Some(Arc::clone(runtime)),
            _ => None,
        }
    }

    /// Returns the runtime, loading it first if no load has succeeded yet.
    pub async fn ensure_ready(&self) -> LoadOutcome<L::Runtime> {
        let pending = {
            let mut state = self.state();
            match &*state {
                BootState::Ready(runtime) => return Ok(Arc::clone(runtime)),
                BootState::Loading(pending) => pending.clone(),
                BootState::Uninitialized | BootState::Failed(_) => {
                    let pending = self.start_load();
                    *state = BootState::Loading(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;
        self.settle(&pending, &outcome);
        outcome
    }

    fn start_load(&self) -> PendingLoad<L::Runtime> {
        let loader = Arc::clone(&self.loader);
        let config = self.config.clone();
        async move {
            log::info!("Loading managed runtime");
            let script = loader.load_script(&config).await?;
            let runtime = loader.initialize(script, &config).await?;
            log::info!("Managed runtime ready (version {})", runtime.version());
            Ok(Arc::new(runtime))
        }
        .boxed()
        .shared()
    }

    // Only the load that is still current may move the state forward; a
    // waiter of an older, failed attempt must not clobber a newer one.
    fn settle(&self, pending: &PendingLoad<L::Runtime>, outcome: &LoadOutcome<L::Runtime>) {
        let mut state = self.state();
        let current = matches!(&*state, BootState::Loading(active) if active.ptr_eq(pending));
        if !current {
            return;
        }
        *state = match outcome {
            Ok(runtime) => BootState::Ready(Arc::clone(runtime)),
            Err(err) => {
                log::warn!("Managed runtime failed to load: {}", err);
                BootState::Failed(err.clone())
            }
        };
    }

    fn state(&self) -> MutexGuard<'_, BootState<L::Runtime>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
