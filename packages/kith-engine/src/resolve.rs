//! The pull resolution path: one narrative in, one [`ExtractionResponse`]
//! out. Input validation happens before any generation call; everything
//! after that is caught at the boundary and folded into a structured
//! failure response.

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Error, NarrativeEngine, NewPerson, Result, extractor};
use kith_domain::{
	DuplicateWarning, ExtractionResponse, Intent, MemoryUpdateMatch, PersonExtraction,
	PersonRecord, TagAssignmentMatch, dates,
};

const READ_HELP: &str = "I can help you view contacts, but I need more specific information. Try asking 'Show me all contacts' or 'Find Tom'.";
const UPDATE_HELP: &str = "I can help you update contacts. Please specify what you'd like to change.";
const GENERAL_HELP: &str = "I'm here to help you manage your contacts. You can:\n- Add new contacts: 'I met Sarah at the conference'\n- Add tags: 'Add Tom to the Work tag'\n- Add memories: 'I saw Michael today. He went for a run'";

#[derive(Clone, Debug, Deserialize)]
pub struct ResolveRequest {
	pub user_id: Uuid,
	pub narrative: String,
}

impl NarrativeEngine {
	/// Resolves one narrative. Invalid input is the caller's problem and
	/// comes back as `Err`; failures past the input gate come back as a
	/// structured failure response.
	pub async fn resolve(&self, request: ResolveRequest) -> Result<ExtractionResponse> {
		self.validate_narrative(&request.narrative)?;

		match self.resolve_inner(&request).await {
			Ok(response) => Ok(response),
			Err(Error::Validation { message }) => {
				warn!(%message, "narrative rejected by domain validation");

				Ok(ExtractionResponse::failure(format!(
					"I had trouble processing that: {message}"
				)))
			},
			Err(e) => {
				warn!(error = %e, "resolution failed");

				Ok(ExtractionResponse::failure("I failed to process your request."))
			},
		}
	}

	fn validate_narrative(&self, narrative: &str) -> Result<()> {
		let max_chars = self.cfg.narrative.max_chars as usize;

		if narrative.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "Narrative cannot be empty.".into() });
		}
		if narrative.chars().count() > max_chars {
			return Err(Error::InvalidRequest {
				message: format!("Narrative too long. Please limit to {max_chars} characters."),
			});
		}

		Ok(())
	}

	async fn resolve_inner(&self, request: &ResolveRequest) -> Result<ExtractionResponse> {
		let generation = &self.cfg.providers.generation;
		let analysis = extractor::classify_intent(
			self.providers.generation.as_ref(),
			generation,
			&request.narrative,
		)
		.await?;

		info!(intent = ?analysis.intent, user_id = %request.user_id, "resolving narrative");

		match analysis.intent {
			Intent::Create => self.handle_create(request).await,
			Intent::UpdateTag => self.handle_update_tag(request).await,
			Intent::UpdateMemory => self.handle_update_memory(request).await,
			Intent::Read => Ok(ExtractionResponse::with_message(Intent::Read, READ_HELP)),
			Intent::Update => Ok(ExtractionResponse::with_message(Intent::Update, UPDATE_HELP)),
			Intent::None => Ok(ExtractionResponse::with_message(Intent::None, GENERAL_HELP)),
		}
	}

	async fn handle_create(&self, request: &ResolveRequest) -> Result<ExtractionResponse> {
		let people = extractor::extract_people(
			self.providers.generation.as_ref(),
			&self.cfg.providers.generation,
			&request.narrative,
		)
		.await?;

		if people.is_empty() {
			return Ok(ExtractionResponse::with_message(
				Intent::None,
				"I couldn't find any people in that message.",
			));
		}

		if let Some(detector) = self.duplicate_detector() {
			let scope = self.store.find_candidates(request.user_id).await?;
			let mut duplicates = Vec::new();

			for extraction in &people {
				if let Some((existing, similarity)) =
					detector.find_similar(&extraction.name, &scope).await?
				{
					duplicates.push(DuplicateWarning {
						extraction: extraction.clone(),
						existing_id: existing.id,
						existing_name: existing.name.clone(),
						existing_notes: existing.notes.clone(),
						similarity,
					});
				}
			}

			if !duplicates.is_empty() {
				return Ok(ExtractionResponse {
					people: Some(people),
					duplicates: Some(duplicates),
					..ExtractionResponse::new(Intent::Create)
				});
			}
		}

		let mut created = Vec::with_capacity(people.len());

		for extraction in &people {
			created.push(self.create_person(request.user_id, extraction).await?);
		}

		Ok(ExtractionResponse {
			message: Some(format!("Added {} new contact(s)", created.len())),
			people: Some(people),
			created_persons: Some(created),
			..ExtractionResponse::new(Intent::Create)
		})
	}

	async fn handle_update_tag(&self, request: &ResolveRequest) -> Result<ExtractionResponse> {
		let assignments = extractor::extract_tag_assignments(
			self.providers.generation.as_ref(),
			&self.cfg.providers.generation,
			&request.narrative,
		)
		.await?;
		let scope = self.store.find_candidates(request.user_id).await?;
		let mut matches = Vec::with_capacity(assignments.len());

		for assignment in assignments {
			let mut matched_people = Vec::with_capacity(assignment.people_names.len());

			for name in &assignment.people_names {
				matched_people.push(self.resolver().resolve(name, &scope).await?);
			}

			matches.push(TagAssignmentMatch {
				tag_name: assignment.tag_name,
				operation: assignment.operation,
				matched_people,
			});
		}

		Ok(ExtractionResponse {
			message: Some("Tag assignments extracted. Please confirm.".into()),
			tag_assignments: Some(matches),
			..ExtractionResponse::new(Intent::UpdateTag)
		})
	}

	async fn handle_update_memory(&self, request: &ResolveRequest) -> Result<ExtractionResponse> {
		let entries = extractor::extract_memory_entries(
			self.providers.generation.as_ref(),
			&self.cfg.providers.generation,
			&request.narrative,
		)
		.await?;
		let scope = self.store.find_candidates(request.user_id).await?;
		let today = dates::today_utc();
		let mut matches = Vec::with_capacity(entries.len());

		for entry in entries {
			let matched_person = self.resolver().resolve(&entry.person_name, &scope).await?;
			let parsed = dates::parse_relative_date(entry.date.as_deref(), today);

			matches.push(MemoryUpdateMatch {
				matched_person,
				entry_content: entry.entry_content,
				parsed_date: dates::format_iso(parsed),
			});
		}

		Ok(ExtractionResponse {
			message: Some("Memory entries extracted. Please confirm.".into()),
			memory_updates: Some(matches),
			..ExtractionResponse::new(Intent::UpdateMemory)
		})
	}

	/// Creates the record and, when the extraction carried attributes,
	/// seeds today's memory entry with them.
	pub(crate) async fn create_person(
		&self,
		user_id: Uuid,
		extraction: &PersonExtraction,
	) -> Result<PersonRecord> {
		let record = self
			.store
			.create_record(
				user_id,
				NewPerson {
					name: extraction.name.clone(),
					notes: None,
					email: extraction.email.clone(),
					phone_number: extraction.phone_number.clone(),
				},
			)
			.await?;

		if let Some(attributes) = &extraction.attributes {
			let today = dates::format_iso(dates::today_utc());

			self.store.upsert_memory_entry(user_id, record.id, &today, attributes).await?;
		}

		Ok(record)
	}
}
