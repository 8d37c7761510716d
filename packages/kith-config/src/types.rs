use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub narrative: Narrative,
	#[serde(default)]
	pub resolver: Resolver,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub generation: GenerationProviderConfig,
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Limits and gates applied to one resolution request.
#[derive(Debug, Clone, Deserialize)]
pub struct Narrative {
	#[serde(default = "default_max_chars")]
	pub max_chars: u32,
	#[serde(default = "default_confidence_threshold")]
	pub confidence_threshold: f32,
	/// Longest pause one annotation send may impose on a streaming workflow.
	#[serde(default = "default_annotation_send_timeout_ms")]
	pub annotation_send_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resolver {
	#[serde(default = "default_strategy")]
	pub strategy: String,
	#[serde(default)]
	pub detect_duplicates: bool,
	#[serde(default = "default_duplicate_threshold")]
	pub duplicate_threshold: f32,
}

impl Default for Narrative {
	fn default() -> Self {
		Self {
			max_chars: default_max_chars(),
			confidence_threshold: default_confidence_threshold(),
			annotation_send_timeout_ms: default_annotation_send_timeout_ms(),
		}
	}
}

impl Default for Resolver {
	fn default() -> Self {
		Self {
			strategy: default_strategy(),
			detect_duplicates: false,
			duplicate_threshold: default_duplicate_threshold(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_retries() -> u32 {
	5
}

fn default_max_chars() -> u32 {
	1000
}

fn default_confidence_threshold() -> f32 {
	0.5
}

fn default_annotation_send_timeout_ms() -> u64 {
	250
}

fn default_strategy() -> String {
	"tiered".to_string()
}

fn default_duplicate_threshold() -> f32 {
	0.85
}
