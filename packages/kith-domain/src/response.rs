use serde::{Deserialize, Serialize};

use crate::{
	extraction::PersonExtraction,
	intent::Intent,
	matching::{DuplicateWarning, MemoryUpdateMatch, TagAssignmentMatch},
	records::PersonRecord,
};

/// Envelope returned for every resolution request. At most one of the
/// payload families is populated; `message` alone covers rejections and
/// empty results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
	pub intent: Intent,
	#[serde(default = "default_success")]
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub people: Option<Vec<PersonExtraction>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_persons: Option<Vec<PersonRecord>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub duplicates: Option<Vec<DuplicateWarning>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tag_assignments: Option<Vec<TagAssignmentMatch>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub memory_updates: Option<Vec<MemoryUpdateMatch>>,
}

impl ExtractionResponse {
	pub fn new(intent: Intent) -> Self {
		Self {
			intent,
			success: true,
			message: None,
			people: None,
			created_persons: None,
			duplicates: None,
			tag_assignments: None,
			memory_updates: None,
		}
	}

	pub fn with_message(intent: Intent, message: impl Into<String>) -> Self {
		Self { message: Some(message.into()), ..Self::new(intent) }
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self { success: false, message: Some(message.into()), ..Self::new(Intent::None) }
	}
}

fn default_success() -> bool {
	true
}
