use std::sync::Arc;

use crate::{config::Config, db::Backend};

pub mod store;

pub use store::{HydrateOptions, Mutation, StateStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StateStore<Backend>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: StateStore<Backend>, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }
}
