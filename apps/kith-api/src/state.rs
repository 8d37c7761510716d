use std::sync::Arc;

use kith_engine::{InMemoryStore, NarrativeEngine};

#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<NarrativeEngine>,
}

impl AppState {
	pub fn new(config: kith_config::Config) -> Self {
		let store = Arc::new(InMemoryStore::new());

		Self { engine: Arc::new(NarrativeEngine::new(config, store)) }
	}

	pub fn with_engine(engine: NarrativeEngine) -> Self {
		Self { engine: Arc::new(engine) }
	}
}
