pub mod confirm;
pub mod extractor;
pub mod prompts;
pub mod resolve;
pub mod resolver;
pub mod store;
pub mod workflow;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use confirm::{
	ConfirmMemoryRequest, ConfirmMemoryResponse, ConfirmPersonRequest, ConfirmPersonResponse,
	ConfirmTagRequest, ConfirmTagResponse,
};
pub use error::{Error, Result};
pub use kith_domain::ExtractionResponse;
pub use resolve::ResolveRequest;
pub use resolver::{EmbeddingResolver, NameResolver, TieredResolver, find_by_name};
pub use store::{InMemoryStore, NewPerson, PersonPatch, RecordStore};
pub use workflow::{Annotation, WorkflowEvent, WorkflowRequest, WorkflowResult};

use kith_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig};
use kith_providers::{SchemaDescriptor, embedding, generate};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate_structured<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		prompt: &'a str,
		schema: &'a SchemaDescriptor,
	) -> BoxFuture<'a, kith_providers::Result<Value>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, kith_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub generation: Arc<dyn GenerationProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}

/// Turns one narrative sentence into validated, disambiguated mutation
/// intents against a user's records. Holds no per-request state; each
/// resolution is an independent unit of work.
pub struct NarrativeEngine {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub providers: Providers,
	resolver: Arc<dyn NameResolver>,
}

struct DefaultProviders;

impl GenerationProvider for DefaultProviders {
	fn generate_structured<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		prompt: &'a str,
		schema: &'a SchemaDescriptor,
	) -> BoxFuture<'a, kith_providers::Result<Value>> {
		Box::pin(generate::generate_structured(cfg, prompt, schema))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, kith_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl Providers {
	pub fn new(generation: Arc<dyn GenerationProvider>, embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { generation, embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { generation: provider.clone(), embedding: provider }
	}
}

impl NarrativeEngine {
	pub fn new(cfg: Config, store: Arc<dyn RecordStore>) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn RecordStore>, providers: Providers) -> Self {
		let resolver = build_resolver(&cfg, &providers);

		Self { cfg, store, providers, resolver }
	}

	pub fn resolver(&self) -> &dyn NameResolver {
		self.resolver.as_ref()
	}

	/// The embedding-similarity duplicate detector, when enabled.
	pub(crate) fn duplicate_detector(&self) -> Option<EmbeddingResolver> {
		if !self.cfg.resolver.detect_duplicates {
			return None;
		}

		Some(EmbeddingResolver::new(
			self.cfg.providers.embedding.clone(),
			self.providers.embedding.clone(),
			self.cfg.resolver.duplicate_threshold,
		))
	}
}

fn build_resolver(cfg: &Config, providers: &Providers) -> Arc<dyn NameResolver> {
	match cfg.resolver.strategy.as_str() {
		"embedding" => Arc::new(EmbeddingResolver::new(
			cfg.providers.embedding.clone(),
			providers.embedding.clone(),
			cfg.resolver.duplicate_threshold,
		)),
		_ => Arc::new(TieredResolver),
	}
}
