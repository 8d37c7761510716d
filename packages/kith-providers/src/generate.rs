use std::{future::Future, time::Duration};

use reqwest::Client;
use serde_json::Value;

use crate::{Error, ErrorKind, Result};
use kith_config::GenerationProviderConfig;

const MAX_BACKOFF_SECS: f64 = 60.0;
const TRANSIENT_WAIT: Duration = Duration::from_secs(2);

/// Machine-readable description of the JSON object a prompt must produce.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
	pub name: &'static str,
	pub schema: Value,
}

impl SchemaDescriptor {
	pub fn new(name: &'static str, schema: Value) -> Self {
		Self { name, schema }
	}
}

/// Ask the generation service for a JSON object matching `schema`.
///
/// Rate-limit failures back off exponentially with jitter (capped at 60s per
/// attempt), transient server failures wait a fixed 2s, malformed responses
/// retry immediately, and anything else fails at once. The sleeps live
/// inside this call's own retry loop; concurrent requests are unaffected.
pub async fn generate_structured(
	cfg: &GenerationProviderConfig,
	prompt: &str,
	schema: &SchemaDescriptor,
) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let prompt = schema_prompt(prompt, schema);

	run_with_retry(cfg.max_retries, || attempt(&client, cfg, &url, &prompt)).await
}

pub(crate) async fn run_with_retry<F, Fut>(max_retries: u32, mut attempt: F) -> Result<Value>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Value>>,
{
	let mut last: Option<Error> = None;

	for n in 0..max_retries {
		match attempt().await {
			Ok(value) => return Ok(value),
			Err(err) => {
				match err.kind() {
					ErrorKind::RateLimited => {
						let wait = rate_limit_backoff(n);

						tracing::debug!(attempt = n, ?wait, "Generation rate limited, backing off.");
						tokio::time::sleep(wait).await;
					},
					ErrorKind::TransientServer => {
						tracing::debug!(attempt = n, "Transient generation failure, retrying.");
						tokio::time::sleep(TRANSIENT_WAIT).await;
					},
					ErrorKind::InvalidResponse => {
						tracing::debug!(attempt = n, "Malformed generation output, retrying.");
					},
					ErrorKind::Fatal => return Err(err),
				}

				last = Some(err);
			},
		}
	}

	Err(Error::RetriesExhausted {
		attempts: max_retries,
		last: last.map(|err| err.to_string()).unwrap_or_else(|| "unknown".to_string()),
	})
}

pub(crate) fn rate_limit_backoff(attempt: u32) -> Duration {
	let secs = 2_f64.powi(attempt.min(16) as i32) + rand::random::<f64>();

	Duration::from_secs_f64(secs.min(MAX_BACKOFF_SECS))
}

async fn attempt(
	client: &Client,
	cfg: &GenerationProviderConfig,
	url: &str,
	prompt: &str,
) -> Result<Value> {
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();
	let text = res.text().await?;

	if !status.is_success() {
		return Err(crate::from_http(status.as_u16(), &text));
	}

	let json: Value = serde_json::from_str(&text).map_err(|_| Error::InvalidResponse {
		message: "Response body is not valid JSON.".to_string(),
	})?;

	match response_content(&json) {
		Some(content) => parse_structured_text(content),
		None if json.is_object() => Ok(json),
		None => Err(Error::InvalidResponse {
			message: "Response is missing structured content.".to_string(),
		}),
	}
}

fn schema_prompt(prompt: &str, schema: &SchemaDescriptor) -> String {
	let schema_text = serde_json::to_string_pretty(&schema.schema).unwrap_or_default();

	format!(
		"{prompt}\n\nRespond with a JSON object that matches this schema:\n{schema_text}\n\n\
		Return ONLY the JSON object, no other text."
	)
}

fn response_content(json: &Value) -> Option<&str> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
}

/// Strip an optional surrounding code fence (with optional `json` tag) and
/// parse the remainder into a JSON object.
pub fn parse_structured_text(text: &str) -> Result<Value> {
	let mut cleaned = text.trim();

	if cleaned.starts_with("```") {
		cleaned = cleaned.split("```").nth(1).unwrap_or_default();
		cleaned = cleaned.strip_prefix("json").unwrap_or(cleaned);
		cleaned = cleaned.trim();
	}

	let value: Value = serde_json::from_str(cleaned).map_err(|_| Error::InvalidResponse {
		message: "Structured content is not valid JSON.".to_string(),
	})?;

	if !value.is_object() {
		return Err(Error::InvalidResponse {
			message: "Structured content is not a JSON object.".to_string(),
		});
	}

	Ok(value)
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	};

	use super::*;

	#[test]
	fn parses_fenced_content() {
		let value = parse_structured_text("```json\n{\"people\": []}\n```").expect("parse failed");

		assert!(value.get("people").is_some());
	}

	#[test]
	fn parses_bare_content() {
		let value = parse_structured_text("{\"intent\": \"create\"}").expect("parse failed");

		assert_eq!(value["intent"], "create");
	}

	#[test]
	fn rejects_non_object_content() {
		assert!(parse_structured_text("[1, 2, 3]").is_err());
		assert!(parse_structured_text("not json").is_err());
	}

	#[test]
	fn extracts_chat_completion_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"people\": []}" } }
			]
		});

		assert_eq!(response_content(&json), Some("{\"people\": []}"));
	}

	#[test]
	fn backoff_is_capped_at_sixty_seconds() {
		for attempt in 0..20 {
			assert!(rate_limit_backoff(attempt) <= Duration::from_secs_f64(MAX_BACKOFF_SECS));
		}
	}

	#[test]
	fn schema_prompt_embeds_schema_and_instruction() {
		let schema = SchemaDescriptor::new(
			"people",
			serde_json::json!({ "type": "object", "properties": {} }),
		);
		let prompt = schema_prompt("Extract people.", &schema);

		assert!(prompt.starts_with("Extract people."));
		assert!(prompt.contains("\"type\": \"object\""));
		assert!(prompt.contains("Return ONLY the JSON object"));
	}

	#[tokio::test(start_paused = true)]
	async fn rate_limited_failures_exhaust_exactly_max_retries() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let err = run_with_retry(5, move || {
			counter.fetch_add(1, Ordering::SeqCst);

			async { Err(Error::RateLimited { message: "HTTP 429: quota".to_string() }) }
		})
		.await
		.expect_err("retries should exhaust");

		assert_eq!(calls.load(Ordering::SeqCst), 5);
		assert!(err.to_string().contains("5 attempts"));
		assert!(err.to_string().contains("quota"));
	}

	#[tokio::test(start_paused = true)]
	async fn fatal_failures_do_not_retry() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let err = run_with_retry(5, move || {
			counter.fetch_add(1, Ordering::SeqCst);

			async { Err(Error::Request { message: "HTTP 401: bad key".to_string() }) }
		})
		.await
		.expect_err("fatal error should surface");

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(matches!(err, Error::Request { .. }));
	}

	#[tokio::test(start_paused = true)]
	async fn transient_failures_recover() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let value = run_with_retry(5, move || {
			let n = counter.fetch_add(1, Ordering::SeqCst);

			async move {
				if n < 2 {
					Err(Error::TransientServer { message: "HTTP 503: overloaded".to_string() })
				} else {
					Ok(serde_json::json!({ "ok": true }))
				}
			}
		})
		.await
		.expect("retry should recover");

		assert_eq!(calls.load(Ordering::SeqCst), 3);
		assert_eq!(value["ok"], true);
	}
}
