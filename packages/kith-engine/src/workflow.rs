//! The streamed orchestration path: detect intent, gate on confidence,
//! identify the subject, then run exactly one terminal handler. Progress
//! annotations flow through an mpsc channel in issuance order; a slow
//! consumer costs at most one capped pause per event, and a departed
//! consumer stops the workflow before the terminal mutation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{Sender, error::SendTimeoutError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Error, NarrativeEngine, NewPerson, PersonPatch, Result, prompts};
use kith_domain::{PersonRecord, validate_person_name};
use kith_providers::SchemaDescriptor;

const FAILURE_MESSAGE: &str = "I failed to process your request";

#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowRequest {
	pub user_id: Uuid,
	pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
	pub role: String,
	pub success: bool,
	pub action: String,
	pub message: String,
	pub people: Vec<PersonRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkflowResult {
	pub role: String,
	pub success: bool,
	pub action: String,
	pub message: String,
	pub people: Vec<PersonRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WorkflowEvent {
	Annotation(Annotation),
	Result(WorkflowResult),
}

impl Annotation {
	fn new(action: &str, message: String) -> Self {
		Self {
			role: "annotation".into(),
			success: true,
			action: action.into(),
			message,
			people: Vec::new(),
		}
	}
}

impl WorkflowResult {
	fn new(success: bool, action: &str, message: String, people: Vec<PersonRecord>) -> Self {
		Self { role: "system".into(), success, action: action.into(), message, people }
	}

	fn error(message: &str) -> Self {
		Self::new(false, "error", message.into(), Vec::new())
	}
}

#[derive(Deserialize)]
struct IntentDetection {
	action: String,
	confidence: f32,
}

#[derive(Deserialize)]
struct PersonIdentification {
	action: String,
	#[serde(default)]
	matched_ids: Vec<Uuid>,
	confidence: String,
	reasoning: String,
	#[serde(default)]
	needs_clarification: bool,
}

#[derive(Deserialize)]
struct CreatePersonData {
	name: String,
	#[serde(default)]
	notes: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	phone_number: Option<String>,
}

#[derive(Deserialize)]
struct UpdatePersonData {
	person_id: Uuid,
	#[serde(default)]
	notes: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	phone_number: Option<String>,
}

impl NarrativeEngine {
	/// Pull entry point: runs the workflow to completion and returns the
	/// terminal result, discarding annotations.
	pub async fn invoke(&self, request: WorkflowRequest) -> WorkflowResult {
		match self.run_workflow(&request, None).await {
			Some(result) => result,
			// Unreachable without a sink; cancellation needs a consumer.
			None => WorkflowResult::error(FAILURE_MESSAGE),
		}
	}

	/// Push entry point: emits ordered [`WorkflowEvent`]s into `tx`. When
	/// the receiver goes away mid-flight, the workflow stops without
	/// running the terminal mutation.
	pub async fn stream(&self, request: WorkflowRequest, tx: Sender<WorkflowEvent>) {
		if let Some(result) = self.run_workflow(&request, Some(&tx)).await {
			let _ = tx
				.send_timeout(WorkflowEvent::Result(result), self.annotation_timeout())
				.await;
		}
	}

	async fn run_workflow(
		&self,
		request: &WorkflowRequest,
		sink: Option<&Sender<WorkflowEvent>>,
	) -> Option<WorkflowResult> {
		match self.workflow_inner(request, sink).await {
			Ok(outcome) => outcome,
			Err(e) => {
				warn!(error = %e, "workflow failed");

				Some(WorkflowResult::error(FAILURE_MESSAGE))
			},
		}
	}

	/// `Ok(None)` means the consumer cancelled; no terminal is produced.
	async fn workflow_inner(
		&self,
		request: &WorkflowRequest,
		sink: Option<&Sender<WorkflowEvent>>,
	) -> Result<Option<WorkflowResult>> {
		if !self.annotate(sink, Annotation::new("route", "Thinking...".into())).await {
			return Ok(None);
		}

		let intent = self.detect_workflow_intent(&request.text).await?;

		if !self
			.annotate(
				sink,
				Annotation::new(
					"route",
					format!("Intent: {} ({:.2})", intent.action, intent.confidence),
				),
			)
			.await
		{
			return Ok(None);
		}

		if intent.confidence < self.cfg.narrative.confidence_threshold {
			self.annotate(
				sink,
				Annotation::new(
					"route",
					format!(
						"Low confidence ({:.2}) - skipping processing",
						intent.confidence
					),
				),
			)
			.await;

			return Ok(Some(WorkflowResult::error("I'm not sure I can help with that.")));
		}

		let scope = self.store.find_candidates(request.user_id).await?;
		let identification = self.identify_person(&request.text, &intent.action, &scope).await?;
		// A create that tripped the duplicate guard still creates; the
		// create handler is where the narrative said to go.
		let action = if identification.action == "clarify" && intent.action == "create" {
			"create".to_string()
		} else {
			identification.action.clone()
		};

		debug!(
			action,
			matches = identification.matched_ids.len(),
			needs_clarification = identification.needs_clarification,
			"workflow identification"
		);

		if !self
			.annotate(
				sink,
				Annotation::new(
					"identify",
					format!(
						"{} ({} matches, {})",
						identification.reasoning,
						identification.matched_ids.len(),
						identification.confidence
					),
				),
			)
			.await
		{
			return Ok(None);
		}

		if sink.is_some_and(Sender::is_closed) {
			return Ok(None);
		}

		let result = match action.as_str() {
			"search" => self.handle_search(&identification, &scope),
			"create" => self.handle_workflow_create(request).await?,
			"update" => self.handle_workflow_update(request, &identification, &scope).await?,
			"clarify" => self.handle_clarify(&identification, &scope),
			_ => WorkflowResult::error("Hmm I'm not sure how to help you with that"),
		};

		Ok(Some(result))
	}

	async fn detect_workflow_intent(&self, text: &str) -> Result<IntentDetection> {
		let prompt = prompts::render(prompts::WORKFLOW_INTENT_PROMPT, text);

		self.workflow_call(&prompt, &prompts::workflow_intent_schema()).await
	}

	async fn identify_person(
		&self,
		text: &str,
		action: &str,
		scope: &[PersonRecord],
	) -> Result<PersonIdentification> {
		let prompt = prompts::render(prompts::WORKFLOW_IDENTIFY_PROMPT, text)
			.replace("{action}", action)
			.replace("{people_list}", &people_list(scope));

		self.workflow_call(&prompt, &prompts::workflow_identify_schema()).await
	}

	fn handle_search(
		&self,
		identification: &PersonIdentification,
		scope: &[PersonRecord],
	) -> WorkflowResult {
		let matched = matched_records(&identification.matched_ids, scope);

		if matched.is_empty() {
			WorkflowResult::error("No matching people found.")
		} else {
			let noun = if matched.len() == 1 { "person" } else { "people" };

			WorkflowResult::new(
				true,
				"search",
				format!("Found {} matching {noun}.", matched.len()),
				matched,
			)
		}
	}

	async fn handle_workflow_create(&self, request: &WorkflowRequest) -> Result<WorkflowResult> {
		let prompt = prompts::render(prompts::WORKFLOW_CREATE_PROMPT, &request.text);
		let data: CreatePersonData =
			self.workflow_call(&prompt, &prompts::workflow_create_schema()).await?;
		let name = validate_person_name(&data.name)?;
		let record = self
			.store
			.create_record(
				request.user_id,
				NewPerson {
					name: name.clone(),
					notes: data.notes,
					email: data.email,
					phone_number: data.phone_number,
				},
			)
			.await?;

		Ok(WorkflowResult::new(
			true,
			"create",
			format!("Created new person: {name}"),
			vec![record],
		))
	}

	async fn handle_workflow_update(
		&self,
		request: &WorkflowRequest,
		identification: &PersonIdentification,
		scope: &[PersonRecord],
	) -> Result<WorkflowResult> {
		if identification.matched_ids.is_empty() {
			return Ok(WorkflowResult::error("Could not find the person to update."));
		}

		let prompt = prompts::render(prompts::WORKFLOW_UPDATE_PROMPT, &request.text)
			.replace("{people_list}", &people_list(scope));
		let data: UpdatePersonData =
			self.workflow_call(&prompt, &prompts::workflow_update_schema()).await?;
		let record = self
			.store
			.update_record(
				request.user_id,
				data.person_id,
				PersonPatch {
					notes: data.notes,
					email: data.email,
					phone_number: data.phone_number,
				},
			)
			.await?;

		Ok(WorkflowResult::new(
			true,
			"update",
			"Updated person information.".into(),
			vec![record],
		))
	}

	fn handle_clarify(
		&self,
		identification: &PersonIdentification,
		scope: &[PersonRecord],
	) -> WorkflowResult {
		WorkflowResult::new(
			true,
			"clarify",
			"I found multiple people with that name. Which one did you mean?".into(),
			matched_records(&identification.matched_ids, scope),
		)
	}

	async fn workflow_call<T>(&self, prompt: &str, schema: &SchemaDescriptor) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let value: Value = self
			.providers
			.generation
			.generate_structured(&self.cfg.providers.generation, prompt, schema)
			.await?;

		serde_json::from_value(value).map_err(|e| Error::Validation { message: e.to_string() })
	}

	/// `false` means the consumer is gone. A full channel only delays by
	/// the configured cap; the event is then dropped, not reordered.
	async fn annotate(&self, sink: Option<&Sender<WorkflowEvent>>, annotation: Annotation) -> bool {
		let Some(tx) = sink else {
			return true;
		};

		match tx
			.send_timeout(WorkflowEvent::Annotation(annotation), self.annotation_timeout())
			.await
		{
			Ok(()) => true,
			Err(SendTimeoutError::Timeout(_)) => true,
			Err(SendTimeoutError::Closed(_)) => false,
		}
	}

	fn annotation_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.narrative.annotation_send_timeout_ms)
	}
}

fn people_list(scope: &[PersonRecord]) -> String {
	scope
		.iter()
		.map(|p| {
			format!(
				"ID: {}\nName: {}\nDescription: {}",
				p.id,
				p.name,
				p.notes.as_deref().unwrap_or("")
			)
		})
		.collect::<Vec<_>>()
		.join("\n---\n")
}

fn matched_records(ids: &[Uuid], scope: &[PersonRecord]) -> Vec<PersonRecord> {
	scope.iter().filter(|p| ids.contains(&p.id)).cloned().collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn events_are_tagged_for_the_wire() {
		let event = WorkflowEvent::Annotation(Annotation::new("route", "Thinking...".into()));
		let json = serde_json::to_value(&event).expect("serialize failed");

		assert_eq!(json["type"], "annotation");
		assert_eq!(json["data"]["role"], "annotation");
		assert_eq!(json["data"]["message"], "Thinking...");
	}

	#[test]
	fn people_list_includes_ids() {
		let record = PersonRecord {
			id: Uuid::new_v4(),
			name: "Sarah".into(),
			notes: Some("Designer".into()),
			email: None,
			phone_number: None,
		};
		let listing = people_list(std::slice::from_ref(&record));

		assert!(listing.contains(&record.id.to_string()));
		assert!(listing.contains("Designer"));
	}
}
