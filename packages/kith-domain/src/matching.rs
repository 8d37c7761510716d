use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extraction::PersonExtraction;

pub const SIMILARITY_EXACT: f32 = 1.0;
pub const SIMILARITY_PARTIAL: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonMatch {
	pub person_id: Uuid,
	pub person_name: String,
	pub similarity: f32,
}

/// Resolution outcome for one extracted name. `is_ambiguous` is computed
/// from the match count at construction and recomputed on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PersonMatchResultWire")]
pub struct PersonMatchResult {
	pub extracted_name: String,
	pub matches: Vec<PersonMatch>,
	is_ambiguous: bool,
}

impl PersonMatchResult {
	pub fn new(extracted_name: String, matches: Vec<PersonMatch>) -> Self {
		let is_ambiguous = matches.len() > 1;

		Self { extracted_name, matches, is_ambiguous }
	}

	pub fn is_ambiguous(&self) -> bool {
		self.is_ambiguous
	}

	pub fn single_match(&self) -> Option<&PersonMatch> {
		if self.matches.len() == 1 { self.matches.first() } else { None }
	}
}

#[derive(Deserialize)]
struct PersonMatchResultWire {
	extracted_name: String,
	#[serde(default)]
	matches: Vec<PersonMatch>,
	#[serde(default, rename = "is_ambiguous")]
	_is_ambiguous: Option<bool>,
}

impl From<PersonMatchResultWire> for PersonMatchResult {
	fn from(wire: PersonMatchResultWire) -> Self {
		Self::new(wire.extracted_name, wire.matches)
	}
}

/// Possible duplicate of an extraction found by embedding similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateWarning {
	pub extraction: PersonExtraction,
	pub existing_id: Uuid,
	pub existing_name: String,
	pub existing_notes: Option<String>,
	pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAssignmentMatch {
	pub tag_name: String,
	pub operation: String,
	pub matched_people: Vec<PersonMatchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryUpdateMatch {
	pub matched_person: PersonMatchResult,
	pub entry_content: String,
	/// ISO `YYYY-MM-DD`, already resolved from the relative token.
	pub parsed_date: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn a_match(name: &str) -> PersonMatch {
		PersonMatch {
			person_id: Uuid::new_v4(),
			person_name: name.to_string(),
			similarity: SIMILARITY_EXACT,
		}
	}

	#[test]
	fn ambiguity_tracks_match_count() {
		let none = PersonMatchResult::new("Tom".to_string(), vec![]);
		let one = PersonMatchResult::new("Tom".to_string(), vec![a_match("Tom")]);
		let two =
			PersonMatchResult::new("Tom".to_string(), vec![a_match("Tom"), a_match("Tommy")]);

		assert!(!none.is_ambiguous());
		assert!(!one.is_ambiguous());
		assert!(two.is_ambiguous());
	}

	#[test]
	fn deserialization_recomputes_ambiguity() {
		let raw = r#"{"extracted_name":"Tom","matches":[],"is_ambiguous":true}"#;
		let result: PersonMatchResult = serde_json::from_str(raw).expect("deserialize failed");

		assert!(!result.is_ambiguous());
	}

	#[test]
	fn single_match_requires_exactly_one() {
		let one = PersonMatchResult::new("Tom".to_string(), vec![a_match("Tom")]);
		let two =
			PersonMatchResult::new("Tom".to_string(), vec![a_match("Tom"), a_match("Tommy")]);

		assert!(one.single_match().is_some());
		assert!(two.single_match().is_none());
	}
}
