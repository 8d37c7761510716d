use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contact as the record store exposes it to resolution. The store owns
/// the rest of the CRM surface; this is the slice the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
	pub id: Uuid,
	pub name: String,
	pub notes: Option<String>,
	pub email: Option<String>,
	pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
	pub id: Uuid,
	pub name: String,
	pub category: String,
}

/// One dated notebook entry for a person. `entry_date` is an ISO `YYYY-MM-DD`
/// string; same-day content is appended, newline-joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntryRecord {
	pub id: Uuid,
	pub person_id: Uuid,
	pub entry_date: String,
	pub content: String,
}
