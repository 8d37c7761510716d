//! Structured-generation calls behind the pull path: intent
//! classification and the three entity extractors. Each helper renders
//! its prompt, calls the generation provider, and deserializes the
//! response into validated domain types. A record that fails a domain
//! invariant rejects the whole response.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{Error, GenerationProvider, Result, prompts};
use kith_config::GenerationProviderConfig;
use kith_domain::{IntentAnalysis, MemoryUpdate, PersonExtraction, TagAssignment};

pub async fn classify_intent(
	provider: &dyn GenerationProvider,
	cfg: &GenerationProviderConfig,
	narrative: &str,
) -> Result<IntentAnalysis> {
	let prompt = prompts::render(prompts::INTENT_DETECTION_PROMPT, narrative);
	let value = provider.generate_structured(cfg, &prompt, &prompts::intent_schema()).await?;
	let analysis = parse::<IntentAnalysis>(value)?;

	debug!(intent = ?analysis.intent, "classified narrative");

	Ok(analysis)
}

pub async fn extract_people(
	provider: &dyn GenerationProvider,
	cfg: &GenerationProviderConfig,
	narrative: &str,
) -> Result<Vec<PersonExtraction>> {
	let prompt = prompts::render(prompts::ENTITY_EXTRACTION_PROMPT, narrative);
	let value = provider.generate_structured(cfg, &prompt, &prompts::people_schema()).await?;

	parse_list(value, "people")
}

pub async fn extract_tag_assignments(
	provider: &dyn GenerationProvider,
	cfg: &GenerationProviderConfig,
	narrative: &str,
) -> Result<Vec<TagAssignment>> {
	let prompt = prompts::render(prompts::TAG_ASSIGNMENT_EXTRACTION_PROMPT, narrative);
	let value =
		provider.generate_structured(cfg, &prompt, &prompts::tag_assignments_schema()).await?;

	parse_list(value, "assignments")
}

pub async fn extract_memory_entries(
	provider: &dyn GenerationProvider,
	cfg: &GenerationProviderConfig,
	narrative: &str,
) -> Result<Vec<MemoryUpdate>> {
	let prompt = prompts::render(prompts::MEMORY_ENTRY_EXTRACTION_PROMPT, narrative);
	let value =
		provider.generate_structured(cfg, &prompt, &prompts::memory_entries_schema()).await?;

	parse_list(value, "entries")
}

fn parse<T>(value: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_json::from_value(value).map_err(|e| Error::Validation { message: e.to_string() })
}

/// Accepts both the enveloped form `{"<key>": [...]}` and a bare array.
fn parse_list<T>(mut value: Value, key: &str) -> Result<Vec<T>>
where
	T: DeserializeOwned,
{
	if let Some(inner) = value.get_mut(key) {
		value = inner.take();
	}

	parse(value)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parse_list_unwraps_envelope() {
		let value = json!({ "people": [{ "name": "Sarah" }] });
		let people: Vec<PersonExtraction> = parse_list(value, "people").unwrap();

		assert_eq!(people.len(), 1);
		assert_eq!(people[0].name, "Sarah");
	}

	#[test]
	fn parse_list_accepts_bare_array() {
		let value = json!([{ "name": "Sarah" }]);
		let people: Vec<PersonExtraction> = parse_list(value, "people").unwrap();

		assert_eq!(people[0].name, "Sarah");
	}

	#[test]
	fn invalid_record_rejects_whole_list() {
		let value = json!({ "people": [{ "name": "Sarah" }, { "name": "X" }] });
		let result: Result<Vec<PersonExtraction>> = parse_list(value, "people");

		assert!(matches!(result, Err(Error::Validation { .. })));
	}
}
