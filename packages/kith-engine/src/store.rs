//! Record storage behind the engine.
//!
//! The engine only ever needs a handful of record operations scoped to a
//! single user, so the trait stays small and every method takes the
//! `user_id` explicitly. [`InMemoryStore`] backs tests and the default
//! server wiring.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{BoxFuture, Error, Result};
use kith_domain::{MemoryEntryRecord, PersonRecord, TagRecord};

#[derive(Clone, Debug)]
pub struct NewPerson {
	pub name: String,
	pub notes: Option<String>,
	pub email: Option<String>,
	pub phone_number: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct PersonPatch {
	pub notes: Option<String>,
	pub email: Option<String>,
	pub phone_number: Option<String>,
}

pub trait RecordStore
where
	Self: Send + Sync,
{
	/// All of the user's person records, the resolver's search scope.
	fn find_candidates<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Vec<PersonRecord>>>;

	fn get_record<'a>(
		&'a self,
		user_id: Uuid,
		id: Uuid,
	) -> BoxFuture<'a, Result<Option<PersonRecord>>>;

	fn create_record<'a>(
		&'a self,
		user_id: Uuid,
		person: NewPerson,
	) -> BoxFuture<'a, Result<PersonRecord>>;

	fn update_record<'a>(
		&'a self,
		user_id: Uuid,
		id: Uuid,
		patch: PersonPatch,
	) -> BoxFuture<'a, Result<PersonRecord>>;

	fn find_or_create_tag<'a>(
		&'a self,
		user_id: Uuid,
		name: &'a str,
		category: &'a str,
	) -> BoxFuture<'a, Result<TagRecord>>;

	fn tag_record<'a>(
		&'a self,
		user_id: Uuid,
		tag_id: Uuid,
		person_id: Uuid,
	) -> BoxFuture<'a, Result<()>>;

	/// Appends to the person's entry for `date` (ISO `YYYY-MM-DD`),
	/// creating it when absent.
	fn upsert_memory_entry<'a>(
		&'a self,
		user_id: Uuid,
		person_id: Uuid,
		date: &'a str,
		content: &'a str,
	) -> BoxFuture<'a, Result<MemoryEntryRecord>>;
}

#[derive(Default)]
struct UserRecords {
	people: Vec<PersonRecord>,
	tags: Vec<TagRecord>,
	entries: Vec<MemoryEntryRecord>,
	assignments: Vec<(Uuid, Uuid)>,
}

#[derive(Default)]
pub struct InMemoryStore {
	users: RwLock<HashMap<Uuid, UserRecords>>,
}

impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl RecordStore for InMemoryStore {
	fn find_candidates<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Vec<PersonRecord>>> {
		Box::pin(async move {
			let users = self.users.read().await;

			Ok(users.get(&user_id).map(|u| u.people.clone()).unwrap_or_default())
		})
	}

	fn get_record<'a>(
		&'a self,
		user_id: Uuid,
		id: Uuid,
	) -> BoxFuture<'a, Result<Option<PersonRecord>>> {
		Box::pin(async move {
			let users = self.users.read().await;

			Ok(users
				.get(&user_id)
				.and_then(|u| u.people.iter().find(|p| p.id == id).cloned()))
		})
	}

	fn create_record<'a>(
		&'a self,
		user_id: Uuid,
		person: NewPerson,
	) -> BoxFuture<'a, Result<PersonRecord>> {
		Box::pin(async move {
			let mut users = self.users.write().await;
			let records = users.entry(user_id).or_default();
			let record = PersonRecord {
				id: Uuid::new_v4(),
				name: person.name,
				notes: person.notes,
				email: person.email,
				phone_number: person.phone_number,
			};

			records.people.push(record.clone());

			Ok(record)
		})
	}

	fn update_record<'a>(
		&'a self,
		user_id: Uuid,
		id: Uuid,
		patch: PersonPatch,
	) -> BoxFuture<'a, Result<PersonRecord>> {
		Box::pin(async move {
			let mut users = self.users.write().await;
			let record = users
				.get_mut(&user_id)
				.and_then(|u| u.people.iter_mut().find(|p| p.id == id))
				.ok_or_else(|| Error::NotFound { message: format!("Person {id} not found") })?;

			if let Some(notes) = patch.notes {
				record.notes = Some(notes);
			}
			if let Some(email) = patch.email {
				record.email = Some(email);
			}
			if let Some(phone_number) = patch.phone_number {
				record.phone_number = Some(phone_number);
			}

			Ok(record.clone())
		})
	}

	fn find_or_create_tag<'a>(
		&'a self,
		user_id: Uuid,
		name: &'a str,
		category: &'a str,
	) -> BoxFuture<'a, Result<TagRecord>> {
		Box::pin(async move {
			let mut users = self.users.write().await;
			let records = users.entry(user_id).or_default();

			if let Some(tag) =
				records.tags.iter().find(|t| t.name.eq_ignore_ascii_case(name))
			{
				return Ok(tag.clone());
			}

			let tag = TagRecord {
				id: Uuid::new_v4(),
				name: name.to_owned(),
				category: category.to_owned(),
			};

			records.tags.push(tag.clone());

			Ok(tag)
		})
	}

	fn tag_record<'a>(
		&'a self,
		user_id: Uuid,
		tag_id: Uuid,
		person_id: Uuid,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut users = self.users.write().await;
			let records = users.entry(user_id).or_default();

			if !records.assignments.contains(&(tag_id, person_id)) {
				records.assignments.push((tag_id, person_id));
			}

			Ok(())
		})
	}

	fn upsert_memory_entry<'a>(
		&'a self,
		user_id: Uuid,
		person_id: Uuid,
		date: &'a str,
		content: &'a str,
	) -> BoxFuture<'a, Result<MemoryEntryRecord>> {
		Box::pin(async move {
			let mut users = self.users.write().await;
			let records = users.entry(user_id).or_default();

			if let Some(entry) = records
				.entries
				.iter_mut()
				.find(|e| e.person_id == person_id && e.entry_date == date)
			{
				entry.content = format!("{}\n{content}", entry.content);

				return Ok(entry.clone());
			}

			let entry = MemoryEntryRecord {
				id: Uuid::new_v4(),
				person_id,
				entry_date: date.to_owned(),
				content: content.to_owned(),
			};

			records.entries.push(entry.clone());

			Ok(entry)
		})
	}
}
