//! Scripted provider doubles and config builders for engine tests. No
//! network, no clock: generation responses are queued up front and
//! embeddings come from a fixed table.

use std::{
	collections::{HashMap, VecDeque},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::Value;

use kith_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use kith_engine::{
	BoxFuture, EmbeddingProvider, GenerationProvider, InMemoryStore, NarrativeEngine, Providers,
};
use kith_providers::SchemaDescriptor;

/// Replays queued responses in order and counts calls, so a test can
/// assert both what came back and that nothing was called at all.
#[derive(Default)]
pub struct ScriptedGeneration {
	responses: Mutex<VecDeque<kith_providers::Result<Value>>>,
	calls: AtomicUsize,
}

impl ScriptedGeneration {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&self, response: Value) {
		self.push_result(Ok(response));
	}

	pub fn push_error(&self, error: kith_providers::Error) {
		self.push_result(Err(error));
	}

	fn push_result(&self, result: kith_providers::Result<Value>) {
		self.responses.lock().unwrap_or_else(|err| err.into_inner()).push_back(result);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl GenerationProvider for ScriptedGeneration {
	fn generate_structured<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		_prompt: &'a str,
		_schema: &'a SchemaDescriptor,
	) -> BoxFuture<'a, kith_providers::Result<Value>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			self.responses
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.pop_front()
				.unwrap_or_else(|| {
					Err(kith_providers::Error::InvalidResponse {
						message: "No scripted response left.".to_string(),
					})
				})
		})
	}
}

/// Looks vectors up by exact text; unknown texts get the fallback
/// vector, which is orthogonal to nothing in particular.
pub struct FixedEmbedding {
	vectors: HashMap<String, Vec<f32>>,
	fallback: Vec<f32>,
}

impl FixedEmbedding {
	pub fn new(vectors: HashMap<String, Vec<f32>>, fallback: Vec<f32>) -> Self {
		Self { vectors, fallback }
	}

	pub fn empty() -> Self {
		Self { vectors: HashMap::new(), fallback: vec![1.0, 0.0, 0.0] }
	}
}

impl EmbeddingProvider for FixedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, kith_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| self.vectors.get(text).unwrap_or(&self.fallback).clone())
				.collect())
		})
	}
}

pub fn test_config() -> Config {
	let raw = r#"
[service]
http_bind = "127.0.0.1:0"

[providers.generation]
provider_id = "test"
api_base    = "http://localhost:0"
api_key     = "test-key"
path        = "/v1/chat/completions"
model       = "test-model"
temperature = 0.1
timeout_ms  = 1000

[providers.embedding]
provider_id = "test"
api_base    = "http://localhost:0"
api_key     = "test-key"
path        = "/v1/embeddings"
model       = "test-embedding"
dimensions  = 3
timeout_ms  = 1000
"#;

	kith_config::parse(raw).expect("test config must be valid")
}

pub fn scripted_engine() -> (NarrativeEngine, Arc<ScriptedGeneration>) {
	scripted_engine_with(test_config())
}

pub fn scripted_engine_with(cfg: Config) -> (NarrativeEngine, Arc<ScriptedGeneration>) {
	let generation = Arc::new(ScriptedGeneration::new());
	let providers = Providers::new(generation.clone(), Arc::new(FixedEmbedding::empty()));
	let engine =
		NarrativeEngine::with_providers(cfg, Arc::new(InMemoryStore::new()), providers);

	(engine, generation)
}
