//! The confirmation half of the protocol: a confirmation-required
//! response from the pull path comes back here as an explicit follow-up
//! call, and only then does the mutation run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, NarrativeEngine, PersonPatch, Result};
use kith_domain::{
	MemoryEntryRecord, PersonExtraction, PersonRecord, TagRecord, dates, validate_person_name,
};

const TAG_CATEGORY_DEFAULT: &str = "general";

#[derive(Clone, Debug, Deserialize)]
pub struct ConfirmPersonRequest {
	pub user_id: Uuid,
	pub extraction: PersonExtraction,
	pub action: String,
	#[serde(default)]
	pub existing_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmPersonResponse {
	pub person: PersonRecord,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConfirmTagRequest {
	pub user_id: Uuid,
	pub tag_name: String,
	#[serde(default = "default_operation")]
	pub operation: String,
	pub person_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmTagResponse {
	pub message: String,
	pub tag: TagRecord,
	pub people: Vec<PersonRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConfirmMemoryRequest {
	pub user_id: Uuid,
	#[serde(default)]
	pub person_id: Option<Uuid>,
	#[serde(default)]
	pub person_name: Option<String>,
	pub content: String,
	#[serde(default)]
	pub date: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmMemoryResponse {
	pub message: String,
	pub entry: MemoryEntryRecord,
}

fn default_operation() -> String {
	"add".to_string()
}

impl NarrativeEngine {
	pub async fn confirm_person(
		&self,
		request: ConfirmPersonRequest,
	) -> Result<ConfirmPersonResponse> {
		match request.action.as_str() {
			"create_new" => {
				let person = self.create_person(request.user_id, &request.extraction).await?;

				Ok(ConfirmPersonResponse { person })
			},
			"link_existing" => {
				let existing_id = request.existing_id.ok_or_else(|| Error::InvalidRequest {
					message: "existing_id required for link_existing action".into(),
				})?;
				let person =
					self.link_to_existing(request.user_id, &request.extraction, existing_id).await?;

				Ok(ConfirmPersonResponse { person })
			},
			other => Err(Error::InvalidRequest {
				message: format!(
					"Invalid action: {other}. Must be 'create_new' or 'link_existing'"
				),
			}),
		}
	}

	pub async fn confirm_tag_assignment(
		&self,
		request: ConfirmTagRequest,
	) -> Result<ConfirmTagResponse> {
		if request.tag_name.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "tag_name is required".into() });
		}
		if request.person_ids.is_empty() {
			return Err(Error::InvalidRequest { message: "person_ids is required".into() });
		}
		if request.operation != "add" {
			return Err(Error::InvalidRequest {
				message: format!("Unsupported operation: {}", request.operation),
			});
		}

		let tag = self
			.store
			.find_or_create_tag(request.user_id, request.tag_name.trim(), TAG_CATEGORY_DEFAULT)
			.await?;
		let mut people = Vec::with_capacity(request.person_ids.len());

		for person_id in &request.person_ids {
			let person =
				self.store.get_record(request.user_id, *person_id).await?.ok_or_else(|| {
					Error::NotFound { message: format!("Person {person_id} not found") }
				})?;

			self.store.tag_record(request.user_id, tag.id, *person_id).await?;
			people.push(person);
		}

		Ok(ConfirmTagResponse {
			message: format!("Added {} person(s) to tag \"{}\"", people.len(), tag.name),
			tag,
			people,
		})
	}

	pub async fn confirm_memory_entry(
		&self,
		request: ConfirmMemoryRequest,
	) -> Result<ConfirmMemoryResponse> {
		if request.content.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "content is required".into() });
		}

		let person_id = match (request.person_id, &request.person_name) {
			(Some(id), None) => {
				if self.store.get_record(request.user_id, id).await?.is_none() {
					return Err(Error::NotFound { message: format!("Person {id} not found") });
				}

				id
			},
			// Unknown name means the person is worth tracking; create
			// them on the spot.
			(None, Some(name)) => {
				let name = validate_person_name(name)?;
				let extraction = PersonExtraction::new(&name, None, None, None)?;

				self.create_person(request.user_id, &extraction).await?.id
			},
			_ => {
				return Err(Error::InvalidRequest {
					message: "Exactly one of person_id or person_name is required".into(),
				});
			},
		};
		let parsed =
			dates::parse_relative_date(request.date.as_deref(), dates::today_utc());
		let entry = self
			.store
			.upsert_memory_entry(
				request.user_id,
				person_id,
				&dates::format_iso(parsed),
				request.content.trim(),
			)
			.await?;

		Ok(ConfirmMemoryResponse { message: "Memory entry added successfully".into(), entry })
	}

	/// Folds a confirmed extraction into an existing record: fills a
	/// missing phone number and appends the attributes to today's entry.
	async fn link_to_existing(
		&self,
		user_id: Uuid,
		extraction: &PersonExtraction,
		existing_id: Uuid,
	) -> Result<PersonRecord> {
		let person = self
			.store
			.get_record(user_id, existing_id)
			.await?
			.ok_or_else(|| Error::NotFound {
				message: format!("Person with id {existing_id} not found"),
			})?;

		if let Some(phone) = &extraction.phone_number
			&& person.phone_number.is_none()
		{
			self.store
				.update_record(
					user_id,
					existing_id,
					PersonPatch { phone_number: Some(phone.clone()), ..Default::default() },
				)
				.await?;
		}

		if let Some(attributes) = &extraction.attributes {
			let today = dates::format_iso(dates::today_utc());

			self.store.upsert_memory_entry(user_id, existing_id, &today, attributes).await?;
		}

		self.store.get_record(user_id, existing_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("Person with id {existing_id} not found"),
		})
	}
}
