//! Name resolution: mapping an extracted name to existing person records.
//!
//! Two strategies implement the same [`NameResolver`] interface. The
//! tiered resolver is pure string matching and the default; the embedding
//! resolver trades provider calls for semantic matching and also backs
//! the optional duplicate detector on the create path.

use std::sync::Arc;

use tracing::debug;

use crate::{BoxFuture, EmbeddingProvider, Result};
use kith_config::EmbeddingProviderConfig;
use kith_domain::{
	PersonMatch, PersonMatchResult, PersonRecord, SIMILARITY_EXACT, SIMILARITY_PARTIAL,
};
use kith_providers::embedding::cosine_similarity;

pub trait NameResolver
where
	Self: Send + Sync,
{
	fn resolve<'a>(
		&'a self,
		name: &'a str,
		scope: &'a [PersonRecord],
	) -> BoxFuture<'a, Result<PersonMatchResult>>;
}

/// Case-insensitive matching in three tiers: exact, starts-with,
/// contains. Better tiers come first; order within a tier follows the
/// scope order.
pub fn find_by_name(name: &str, scope: &[PersonRecord]) -> Vec<PersonMatch> {
	let needle = name.trim().to_lowercase();

	if needle.is_empty() {
		return Vec::new();
	}

	let mut exact = Vec::new();
	let mut starts_with = Vec::new();
	let mut contains = Vec::new();

	for record in scope {
		let candidate = record.name.to_lowercase();
		let hit = PersonMatch {
			person_id: record.id,
			person_name: record.name.clone(),
			similarity: if candidate == needle { SIMILARITY_EXACT } else { SIMILARITY_PARTIAL },
		};

		if candidate == needle {
			exact.push(hit);
		} else if candidate.starts_with(&needle) {
			starts_with.push(hit);
		} else if candidate.contains(&needle) {
			contains.push(hit);
		}
	}

	exact.extend(starts_with);
	exact.extend(contains);
	exact
}

pub struct TieredResolver;

impl NameResolver for TieredResolver {
	fn resolve<'a>(
		&'a self,
		name: &'a str,
		scope: &'a [PersonRecord],
	) -> BoxFuture<'a, Result<PersonMatchResult>> {
		Box::pin(async move {
			let matches = find_by_name(name, scope);

			debug!(name, count = matches.len(), "tiered name resolution");

			Ok(PersonMatchResult::new(name.to_owned(), matches))
		})
	}
}

pub struct EmbeddingResolver {
	cfg: EmbeddingProviderConfig,
	provider: Arc<dyn EmbeddingProvider>,
	threshold: f32,
}

impl EmbeddingResolver {
	pub fn new(
		cfg: EmbeddingProviderConfig,
		provider: Arc<dyn EmbeddingProvider>,
		threshold: f32,
	) -> Self {
		Self { cfg, provider, threshold }
	}

	/// Best candidate above the threshold, if any. The query and every
	/// candidate name go out in a single embedding request.
	pub async fn find_similar<'a>(
		&self,
		name: &str,
		scope: &'a [PersonRecord],
	) -> Result<Option<(&'a PersonRecord, f32)>> {
		if scope.is_empty() {
			return Ok(None);
		}

		let mut texts = Vec::with_capacity(scope.len() + 1);

		texts.push(name.to_owned());
		texts.extend(scope.iter().map(|p| p.name.clone()));

		let vectors = self.provider.embed(&self.cfg, &texts).await?;
		let (query, candidates) = match vectors.split_first() {
			Some(split) => split,
			None => return Ok(None),
		};
		let mut best: Option<(&PersonRecord, f32)> = None;

		for (record, vector) in scope.iter().zip(candidates) {
			let score = cosine_similarity(query, vector);

			if score >= self.threshold && best.is_none_or(|(_, s)| score > s) {
				best = Some((record, score));
			}
		}

		debug!(name, hit = best.is_some(), "embedding name resolution");

		Ok(best)
	}
}

impl NameResolver for EmbeddingResolver {
	fn resolve<'a>(
		&'a self,
		name: &'a str,
		scope: &'a [PersonRecord],
	) -> BoxFuture<'a, Result<PersonMatchResult>> {
		Box::pin(async move {
			let matches = match self.find_similar(name, scope).await? {
				Some((record, score)) => vec![PersonMatch {
					person_id: record.id,
					person_name: record.name.clone(),
					similarity: score,
				}],
				None => Vec::new(),
			};

			Ok(PersonMatchResult::new(name.to_owned(), matches))
		})
	}
}

#[cfg(test)]
mod tests {
	use uuid::Uuid;

	use super::*;

	fn record(name: &str) -> PersonRecord {
		PersonRecord {
			id: Uuid::new_v4(),
			name: name.to_owned(),
			notes: None,
			email: None,
			phone_number: None,
		}
	}

	#[test]
	fn exact_matches_rank_before_partial() {
		let scope = [record("John Tomson"), record("Tommy"), record("Tom")];
		let matches = find_by_name("Tom", &scope);
		let names: Vec<_> = matches.iter().map(|m| m.person_name.as_str()).collect();

		assert_eq!(names, ["Tom", "Tommy", "John Tomson"]);
		assert_eq!(matches[0].similarity, SIMILARITY_EXACT);
		assert_eq!(matches[1].similarity, SIMILARITY_PARTIAL);
	}

	#[test]
	fn matching_ignores_case() {
		let scope = [record("Sarah")];
		let matches = find_by_name("sarah", &scope);

		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].similarity, SIMILARITY_EXACT);
	}

	#[test]
	fn blank_query_matches_nothing() {
		let scope = [record("Sarah")];

		assert!(find_by_name("   ", &scope).is_empty());
	}

	#[tokio::test]
	async fn tiered_resolver_flags_ambiguity() {
		let scope = [record("Tom"), record("Tommy")];
		let result = TieredResolver.resolve("Tom", &scope).await.unwrap();

		assert!(result.is_ambiguous());
		assert_eq!(result.matches.len(), 2);
	}
}
