mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, GenerationProviderConfig, Narrative, Providers, Resolver,
	Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw)
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw).map_err(|err| Error::ParseConfig { source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.narrative.max_chars == 0 {
		return Err(Error::Validation {
			message: "narrative.max_chars must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.narrative.confidence_threshold) {
		return Err(Error::Validation {
			message: "narrative.confidence_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.narrative.annotation_send_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "narrative.annotation_send_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.resolver.strategy.as_str(), "tiered" | "embedding") {
		return Err(Error::Validation {
			message: "resolver.strategy must be one of tiered or embedding.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.resolver.duplicate_threshold) {
		return Err(Error::Validation {
			message: "resolver.duplicate_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.providers.generation.max_retries == 0 {
		return Err(Error::Validation {
			message: "providers.generation.max_retries must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&cfg.providers.generation.temperature) {
		return Err(Error::Validation {
			message: "providers.generation.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("generation", &cfg.providers.generation.api_key),
		("embedding", &cfg.providers.embedding.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.resolver.strategy = cfg.resolver.strategy.trim().to_ascii_lowercase();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
