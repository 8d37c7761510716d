use kith_config::{Config, validate};

fn example_toml() -> &'static str {
	r#"
[service]
http_bind = "127.0.0.1:8080"
log_level = "info"

[providers.generation]
provider_id = "gemini"
api_base    = "https://generativelanguage.googleapis.com"
api_key     = "key"
path        = "/v1beta/openai/chat/completions"
model       = "gemini-2.0-flash"
temperature = 0.1
timeout_ms  = 30000

[providers.embedding]
provider_id = "openai"
api_base    = "https://api.openai.com"
api_key     = "key"
path        = "/v1/embeddings"
model       = "text-embedding-3-small"
dimensions  = 768
timeout_ms  = 30000

[narrative]

[resolver]
strategy          = "tiered"
detect_duplicates = true
"#
}

fn parse(raw: &str) -> Config {
	toml::from_str(raw).expect("config should parse")
}

#[test]
fn example_config_parses_and_validates() {
	let cfg = parse(example_toml());

	assert!(validate(&cfg).is_ok());
	assert_eq!(cfg.providers.generation.max_retries, 5);
	assert_eq!(cfg.narrative.max_chars, 1000);
	assert_eq!(cfg.narrative.confidence_threshold, 0.5);
	assert_eq!(cfg.resolver.duplicate_threshold, 0.85);
}

#[test]
fn rejects_unknown_resolver_strategy() {
	let raw = example_toml().replace("strategy          = \"tiered\"", "strategy          = \"soundex\"");
	let cfg = parse(&raw);

	let err = validate(&cfg).expect_err("strategy should be rejected");

	assert!(err.to_string().contains("resolver.strategy"));
}

#[test]
fn rejects_out_of_range_confidence_threshold() {
	let raw = example_toml().replace("[narrative]", "[narrative]\nconfidence_threshold = 1.5");
	let cfg = parse(&raw);

	let err = validate(&cfg).expect_err("threshold should be rejected");

	assert!(err.to_string().contains("confidence_threshold"));
}

#[test]
fn rejects_blank_api_key() {
	let raw = example_toml().replacen("api_key     = \"key\"", "api_key     = \" \"", 1);
	let cfg = parse(&raw);

	let err = validate(&cfg).expect_err("blank key should be rejected");

	assert!(err.to_string().contains("api_key"));
}
