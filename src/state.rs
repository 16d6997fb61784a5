use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{PermissionGate, ResultAssembler, ScoringEngine, SessionLister},
    store::{RoleStore, SessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub gate: PermissionGate,
    pub scoring: ScoringEngine,
    pub results: ResultAssembler,
    pub lister: SessionLister,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn SessionStore>, roles: Arc<dyn RoleStore>, config: Config) -> Self {
        Self {
            gate: PermissionGate::new(roles),
            scoring: ScoringEngine::new(store.clone()),
            results: ResultAssembler::new(store.clone()),
            lister: SessionLister::new(store),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
