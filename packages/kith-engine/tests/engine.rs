use serde_json::json;
use uuid::Uuid;

use kith_domain::{Intent, PersonExtraction, dates};
use kith_engine::{
	ConfirmMemoryRequest, ConfirmPersonRequest, ConfirmTagRequest, Error, NewPerson,
	ResolveRequest, find_by_name,
};
use kith_testkit::{scripted_engine, scripted_engine_with, test_config};

fn request(narrative: &str) -> ResolveRequest {
	ResolveRequest { user_id: Uuid::new_v4(), narrative: narrative.to_string() }
}

fn extraction(name: &str) -> PersonExtraction {
	PersonExtraction::new(name, Some("from the conference"), None, None)
		.expect("extraction should be valid")
}

#[tokio::test]
async fn oversized_narrative_fails_before_any_generation_call() {
	let (engine, generation) = scripted_engine();
	let result = engine.resolve(request(&"x".repeat(1001))).await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
	assert_eq!(generation.calls(), 0);
}

#[tokio::test]
async fn blank_narrative_fails_before_any_generation_call() {
	let (engine, generation) = scripted_engine();
	let result = engine.resolve(request("   \n  ")).await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
	assert_eq!(generation.calls(), 0);
}

#[tokio::test]
async fn create_intent_creates_all_extracted_people() {
	let (engine, generation) = scripted_engine();

	generation.push(json!({ "intent": "create" }));
	generation.push(json!({
		"people": [
			{ "name": "Sarah", "attributes": "designer from Portland" },
			{ "name": "Alex", "email": "Alex@Google.com" }
		]
	}));

	let req = request("Met Sarah and Alex at the conference.");
	let user_id = req.user_id;
	let response = engine.resolve(req).await.expect("resolve should succeed");

	assert!(response.success);
	assert_eq!(response.intent, Intent::Create);
	assert_eq!(response.message.as_deref(), Some("Added 2 new contact(s)"));

	let created = response.created_persons.expect("people should be created");

	assert_eq!(created.len(), 2);
	assert_eq!(created[1].email.as_deref(), Some("alex@google.com"));

	let stored = engine.store.find_candidates(user_id).await.expect("store should answer");

	assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn empty_extraction_is_not_an_error() {
	let (engine, generation) = scripted_engine();

	generation.push(json!({ "intent": "create" }));
	generation.push(json!({ "people": [] }));

	let response = engine
		.resolve(request("We all met up downtown."))
		.await
		.expect("resolve should succeed");

	assert!(response.success);
	assert_eq!(response.intent, Intent::None);
	assert_eq!(
		response.message.as_deref(),
		Some("I couldn't find any people in that message.")
	);
	assert!(response.created_persons.is_none());
}

#[tokio::test]
async fn read_intent_returns_guidance_without_extraction() {
	let (engine, generation) = scripted_engine();

	generation.push(json!({ "intent": "read" }));

	let response = engine.resolve(request("Who is Sarah?")).await.expect("resolve should succeed");

	assert_eq!(response.intent, Intent::Read);
	assert!(response.message.expect("message should be set").contains("Find Tom"));
	assert_eq!(generation.calls(), 1);
}

#[tokio::test]
async fn tag_intent_returns_confirmation_required_matches() {
	let (engine, generation) = scripted_engine();
	let user_id = Uuid::new_v4();

	for name in ["Tom", "Tommy"] {
		engine
			.store
			.create_record(
				user_id,
				NewPerson {
					name: name.to_string(),
					notes: None,
					email: None,
					phone_number: None,
				},
			)
			.await
			.expect("seed record");
	}

	generation.push(json!({ "intent": "update_tag" }));
	generation.push(json!({
		"assignments": [
			{ "people_names": ["Tom"], "tag_name": "Work", "operation": "add" }
		]
	}));

	let response = engine
		.resolve(ResolveRequest { user_id, narrative: "Add Tom to the Work tag".into() })
		.await
		.expect("resolve should succeed");

	assert_eq!(response.intent, Intent::UpdateTag);
	assert_eq!(
		response.message.as_deref(),
		Some("Tag assignments extracted. Please confirm.")
	);

	let assignments = response.tag_assignments.expect("assignments expected");

	assert_eq!(assignments[0].tag_name, "Work");
	// "Tom" matches both Tom and Tommy, so confirmation must resolve it.
	assert!(assignments[0].matched_people[0].is_ambiguous());
	assert_eq!(assignments[0].matched_people[0].matches[0].person_name, "Tom");
}

#[tokio::test]
async fn memory_intent_resolves_relative_dates() {
	let (engine, generation) = scripted_engine();
	let user_id = Uuid::new_v4();

	engine
		.store
		.create_record(
			user_id,
			NewPerson { name: "Sarah".into(), notes: None, email: None, phone_number: None },
		)
		.await
		.expect("seed record");

	generation.push(json!({ "intent": "update_memory" }));
	generation.push(json!({
		"entries": [
			{
				"person_name": "Sarah",
				"entry_content": "had coffee together",
				"date": "yesterday"
			}
		]
	}));

	let response = engine
		.resolve(ResolveRequest { user_id, narrative: "Had coffee with Sarah yesterday".into() })
		.await
		.expect("resolve should succeed");
	let updates = response.memory_updates.expect("updates expected");
	let yesterday = dates::format_iso(dates::today_utc() - time::Duration::days(1));

	assert_eq!(updates[0].parsed_date, yesterday);
	assert_eq!(updates[0].matched_person.matches.len(), 1);
}

#[tokio::test]
async fn duplicate_risk_defers_creation_until_confirmation() {
	let mut cfg = test_config();

	cfg.resolver.detect_duplicates = true;

	let (engine, generation) = scripted_engine_with(cfg);
	let user_id = Uuid::new_v4();

	engine
		.store
		.create_record(
			user_id,
			NewPerson { name: "Sarah".into(), notes: None, email: None, phone_number: None },
		)
		.await
		.expect("seed record");

	generation.push(json!({ "intent": "create" }));
	generation.push(json!({ "people": [{ "name": "Sarah" }] }));

	let response = engine
		.resolve(ResolveRequest { user_id, narrative: "I met Sarah today".into() })
		.await
		.expect("resolve should succeed");
	let duplicates = response.duplicates.expect("duplicates expected");

	assert_eq!(duplicates[0].existing_name, "Sarah");
	assert!(response.created_persons.is_none());
	// Still only the seeded record; nothing was mutated.
	assert_eq!(engine.store.find_candidates(user_id).await.expect("store").len(), 1);
}

#[tokio::test]
async fn invalid_extraction_surfaces_as_structured_failure() {
	let (engine, generation) = scripted_engine();

	generation.push(json!({ "intent": "create" }));
	generation.push(json!({ "people": [{ "name": "X" }] }));

	let response =
		engine.resolve(request("I met X today")).await.expect("resolve should succeed");

	assert!(!response.success);
	assert!(response.message.expect("message should be set").contains("trouble processing"));
}

#[tokio::test]
async fn provider_failure_surfaces_as_structured_failure() {
	let (engine, generation) = scripted_engine();

	generation.push_error(kith_providers::Error::RetriesExhausted {
		attempts: 5,
		last: "quota exceeded".into(),
	});

	let response =
		engine.resolve(request("I met Sarah today")).await.expect("resolve should succeed");

	assert!(!response.success);
	assert_eq!(response.message.as_deref(), Some("I failed to process your request."));
}

#[tokio::test]
async fn confirm_person_rejects_unknown_action() {
	let (engine, _) = scripted_engine();
	let result = engine
		.confirm_person(ConfirmPersonRequest {
			user_id: Uuid::new_v4(),
			extraction: extraction("Sarah"),
			action: "merge".into(),
			existing_id: None,
		})
		.await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn confirm_person_link_requires_existing_id() {
	let (engine, _) = scripted_engine();
	let result = engine
		.confirm_person(ConfirmPersonRequest {
			user_id: Uuid::new_v4(),
			extraction: extraction("Sarah"),
			action: "link_existing".into(),
			existing_id: None,
		})
		.await;

	assert!(matches!(result, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn confirm_person_link_rejects_unknown_id() {
	let (engine, _) = scripted_engine();
	let result = engine
		.confirm_person(ConfirmPersonRequest {
			user_id: Uuid::new_v4(),
			extraction: extraction("Sarah"),
			action: "link_existing".into(),
			existing_id: Some(Uuid::new_v4()),
		})
		.await;

	assert!(matches!(result, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn confirm_person_create_seeds_todays_memory_entry() {
	let (engine, _) = scripted_engine();
	let user_id = Uuid::new_v4();
	let response = engine
		.confirm_person(ConfirmPersonRequest {
			user_id,
			extraction: extraction("Sarah"),
			action: "create_new".into(),
			existing_id: None,
		})
		.await
		.expect("confirmation should succeed");
	let today = dates::format_iso(dates::today_utc());
	// Appending proves the seeded entry exists for today.
	let entry = engine
		.store
		.upsert_memory_entry(user_id, response.person.id, &today, "met again")
		.await
		.expect("store should answer");

	assert_eq!(entry.content, "from the conference\nmet again");
}

#[tokio::test]
async fn confirm_person_link_fills_missing_phone() {
	let (engine, _) = scripted_engine();
	let user_id = Uuid::new_v4();
	let existing = engine
		.store
		.create_record(
			user_id,
			NewPerson { name: "Sarah".into(), notes: None, email: None, phone_number: None },
		)
		.await
		.expect("seed record");
	let with_phone = PersonExtraction::new("Sarah", None, None, Some("415-555-0123"))
		.expect("extraction should be valid");
	let response = engine
		.confirm_person(ConfirmPersonRequest {
			user_id,
			extraction: with_phone,
			action: "link_existing".into(),
			existing_id: Some(existing.id),
		})
		.await
		.expect("confirmation should succeed");

	assert_eq!(response.person.id, existing.id);
	assert_eq!(response.person.phone_number.as_deref(), Some("415-555-0123"));
}

#[tokio::test]
async fn confirm_tag_creates_tag_and_links_people() {
	let (engine, _) = scripted_engine();
	let user_id = Uuid::new_v4();
	let mut ids = Vec::new();

	for name in ["Tom", "Jane"] {
		let record = engine
			.store
			.create_record(
				user_id,
				NewPerson {
					name: name.to_string(),
					notes: None,
					email: None,
					phone_number: None,
				},
			)
			.await
			.expect("seed record");

		ids.push(record.id);
	}

	let response = engine
		.confirm_tag_assignment(ConfirmTagRequest {
			user_id,
			tag_name: "Work".into(),
			operation: "add".into(),
			person_ids: ids,
		})
		.await
		.expect("confirmation should succeed");

	assert_eq!(response.message, "Added 2 person(s) to tag \"Work\"");
	assert_eq!(response.tag.category, "general");
	assert_eq!(response.people.len(), 2);
}

#[tokio::test]
async fn confirm_memory_creates_unknown_person_implicitly() {
	let (engine, _) = scripted_engine();
	let user_id = Uuid::new_v4();
	let response = engine
		.confirm_memory_entry(ConfirmMemoryRequest {
			user_id,
			person_id: None,
			person_name: Some("Michael Wu".into()),
			content: "went for a run in Golden Gate Park".into(),
			date: Some("today".into()),
		})
		.await
		.expect("confirmation should succeed");

	assert_eq!(response.message, "Memory entry added successfully");

	let people = engine.store.find_candidates(user_id).await.expect("store should answer");

	assert_eq!(people.len(), 1);
	assert_eq!(people[0].name, "Michael Wu");
	assert_eq!(response.entry.person_id, people[0].id);
}

#[tokio::test]
async fn confirm_memory_requires_exactly_one_subject() {
	let (engine, _) = scripted_engine();
	let both = engine
		.confirm_memory_entry(ConfirmMemoryRequest {
			user_id: Uuid::new_v4(),
			person_id: Some(Uuid::new_v4()),
			person_name: Some("Sarah".into()),
			content: "coffee".into(),
			date: None,
		})
		.await;
	let neither = engine
		.confirm_memory_entry(ConfirmMemoryRequest {
			user_id: Uuid::new_v4(),
			person_id: None,
			person_name: None,
			content: "coffee".into(),
			date: None,
		})
		.await;

	assert!(matches!(both, Err(Error::InvalidRequest { .. })));
	assert!(matches!(neither, Err(Error::InvalidRequest { .. })));
}

#[test]
fn tiered_matching_orders_exact_before_partial() {
	let records = ["John Tomson", "Tommy", "Tom"]
		.map(|name| kith_domain::PersonRecord {
			id: Uuid::new_v4(),
			name: name.to_string(),
			notes: None,
			email: None,
			phone_number: None,
		});
	let names: Vec<_> =
		find_by_name("tom", &records).into_iter().map(|m| m.person_name).collect();

	assert_eq!(names, ["Tom", "Tommy", "John Tomson"]);
}
