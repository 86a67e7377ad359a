// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{AttemptController, LifecycleController},
    store::Store,
    utils::clock::Clock,
};

#[derive(Clone)]
pub struct AppState<S: Store> {
    pub lifecycle: Arc<LifecycleController<S>>,
    pub attempts: Arc<AttemptController<S>>,
    pub config: Config,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, config: Config) -> Self {
        Self {
            lifecycle: Arc::new(LifecycleController::new(store.clone())),
            attempts: Arc::new(AttemptController::new(store, clock)),
            config,
        }
    }
}

impl<S: Store> FromRef<AppState<S>> for Config {
    fn from_ref(state: &AppState<S>) -> Self {
        state.config.clone()
    }
}
