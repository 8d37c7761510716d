//! Prompt templates and response schemas for every structured call the
//! engine makes. Each prompt pairs with exactly one [`SchemaDescriptor`].

use serde_json::json;

use kith_providers::SchemaDescriptor;

pub const INTENT_DETECTION_PROMPT: &str = r#"You are an intent classifier for a contact management system.

Classify the user's message into one of these intents:
- CREATE: User wants to add new contacts (keywords: "met", "add", "new", "create" + person names)
- READ: User wants to view contact information (keywords: "show", "find", "who is", "tell me about")
- UPDATE_TAG: User wants to add tags to existing people (keywords: "tag", "add tag", "part of")
- UPDATE_MEMORY: User wants to add a memory entry about existing people (keywords: "I saw", "had coffee with", about existing people)
- UPDATE: User wants to modify existing contact details (keywords: "change", "update", "edit", "modify" + specific fields)
- NONE: Everything else (greetings, chitchat, questions, unrelated topics)

Examples:

Input: "I met Sarah at the tech conference yesterday. She's a designer from Portland."
Intent: create

Input: "Just had coffee with Tom and Jane. Tom rides a motorcycle and Jane plays banjo."
Intent: create

Input: "Add a new contact named Alex who works at Google"
Intent: create

Input: "Show me Tom's contact information"
Intent: read

Input: "Who is Sarah?"
Intent: read

Input: "TJ and Jane are part of Noisebridge. Add the tag."
Intent: update_tag

Input: "Add Sarah and Tom to the Work tag"
Intent: update_tag

Input: "I saw Michael Wu today. He went for a run in Golden Gate Park."
Intent: update_memory

Input: "Had coffee with Sarah yesterday. She mentioned her new job at Google."
Intent: update_memory

Input: "Update Jane's email to jane@example.com"
Intent: update

Input: "Change Tom's phone number"
Intent: update

Input: "What's the weather like today?"
Intent: none

Input: "Hello! How are you?"
Intent: none

Input: "Tell me a joke"
Intent: none

Input: "I'm thinking about meeting someone tomorrow"
Intent: none

Now classify this message:

"{narrative}"

Respond with the intent classification."#;

pub const ENTITY_EXTRACTION_PROMPT: &str = r#"You are an expert at extracting people and their attributes from narratives.

Extract all people mentioned in the text along with their attributes.

For each person, extract:
- name: The person's name (required)
- attributes: Notable characteristics, interests, or context (optional)
- email: Email address if mentioned (optional)
- phone_number: Phone number if mentioned (optional)

Examples:

Input: "I met Tom today. He has blonde hair and rides a motorcycle."
Output:
- name: "Tom"
  attributes: "blonde hair, rides a motorcycle"
  email: null
  phone_number: null

Input: "Met Sarah and Alex at the conference. Sarah is a designer from Portland. Alex works at Google and his email is alex@google.com."
Output:
- name: "Sarah"
  attributes: "designer from Portland"
  email: null
  phone_number: null
- name: "Alex"
  attributes: "works at Google"
  email: "alex@google.com"
  phone_number: null

Input: "Had coffee with Jane who plays the banjo. Her number is 415-555-0123."
Output:
- name: "Jane"
  attributes: "plays the banjo"
  email: null
  phone_number: "415-555-0123"

Now extract people from this narrative:

"{narrative}"

Extract all people with their attributes."#;

pub const TAG_ASSIGNMENT_EXTRACTION_PROMPT: &str = r#"Extract tag assignment operations from the user's message.

For each tag assignment, extract:
- people_names: List of people's names mentioned
- tag_name: The tag to add
- operation: Always "add" (we only support adding tags for now)

Examples:

Input: "TJ, Jane, and Dali are all part of Noisebridge. Please add the tag."
Output:
- people_names: ["TJ", "Jane", "Dali"]
  tag_name: "Noisebridge"
  operation: "add"

Input: "Add Sarah and Tom to the Work tag"
Output:
- people_names: ["Sarah", "Tom"]
  tag_name: "Work"
  operation: "add"

Input: "Tag Michael as a friend"
Output:
- people_names: ["Michael"]
  tag_name: "friend"
  operation: "add"

Now extract tag assignments from this message:

"{narrative}"

Extract all tag assignment operations."#;

pub const MEMORY_ENTRY_EXTRACTION_PROMPT: &str = r#"Extract memory entries about people from the user's message.

For each memory entry, extract:
- person_name: The person's name
- entry_content: What happened or was said (in past tense, concise)
- date: "today" if not specified, otherwise extract relative date

Examples:

Input: "I saw Michael Wu today. He went for a run in Golden Gate Park. He's dating. He tripped."
Output:
- person_name: "Michael Wu"
  entry_content: "went for a run in Golden Gate Park, is dating, tripped"
  date: "today"

Input: "Had coffee with Sarah yesterday. She mentioned her new job at Google."
Output:
- person_name: "Sarah"
  entry_content: "had coffee together, mentioned new job at Google"
  date: "yesterday"

Input: "I saw Tom and Jane at the park. Tom was on his motorcycle and Jane was playing banjo."
Output:
- person_name: "Tom"
  entry_content: "saw at the park, was on his motorcycle"
  date: "today"
- person_name: "Jane"
  entry_content: "saw at the park, was playing banjo"
  date: "today"

Now extract memory entries from this message:

"{narrative}"

Extract all memory entry information."#;

pub const WORKFLOW_INTENT_PROMPT: &str = r#"You are an AI assistant helping to determine if a user's input is a search query, a request to create a new person, or a request to update an existing person.

Given the following input:
{narrative}

Determine if this is:
1. A search query (asking about existing people)
2. A request to create a new person (providing information about someone to add)
3. A request to update an existing person (adding/modifying information about someone who already exists)

Consider these patterns:
- Questions like "who", "where", "find", "search" typically indicate a search
- Statements with names and details for new people typically indicate a create request
- Statements about adding information to, updating, or modifying existing people indicate an update
- Phrases like "update John's", "add to Sarah's profile", "change Mike's", "John now works at" indicate updates
- If the text mentions someone by name and adds new information about them, it's likely an update
- If unsure, default to search

Provide:
- action: either "search", "create", or "update"
- confidence: a number between 0 and 1 representing how confident you are in this classification"#;

pub const WORKFLOW_IDENTIFY_PROMPT: &str = r#"You are an AI assistant helping to identify people based on user input and the detected action intent.

Given the following user input:
{narrative}

The detected action is: {action}

And the following list of existing people:
{people_list}

Your task is to:
1. If action is "search": Find people who match the search description
2. If action is "update": Find the specific person being referenced for updating
3. If action is "create": Check if the person already exists (to avoid duplicates)

Return your response with:
- action: The confirmed action (search, create, update, or "clarify" if multiple people match)
- matched_ids: Array of IDs of matching people (empty array if no matches)
- confidence: "certain" if single clear match, "uncertain" if unsure, "no_matches" if none, "multiple_matches" if several people match
- reasoning: Brief explanation of your decision
- needs_clarification: true if multiple people match and we need user to clarify which one

Guidelines:
- For "search": Return all matching people, even if multiple
- For "update": If multiple people have the same name/details, set needs_clarification=true and action="clarify"
- For "create": If a person with similar name/details already exists, set needs_clarification=true and action="clarify"
- If action is "update" but no existing person is found, change action to "create"
- Pay attention to distinguishing details in the user input (nicknames, descriptions, context)"#;

pub const WORKFLOW_CREATE_PROMPT: &str = r#"You are an AI assistant helping to create a new person in a database.
Given the following description:
{narrative}

Please extract the following information:
- name (required)
- notes (optional, description of the person). If information provided about the person does not fit into another field, put it here.
- email (optional). If none, return null.
- phone_number (optional). If none, return null."#;

pub const WORKFLOW_UPDATE_PROMPT: &str = r#"You are an AI assistant helping to update an existing person in a database.
Given the following update request:
{narrative}

And the following list of existing people:
{people_list}

Please identify which person to update and what information to update:
- person_id (required, the id of the person to update from the people list)
- notes (optional, additional description to add or replace)
- email (optional)
- phone_number (optional)

Only include fields that should be updated. If a field is not mentioned in the update request, set it to null."#;

pub fn render(template: &str, narrative: &str) -> String {
	template.replace("{narrative}", narrative)
}

pub fn intent_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "intent_analysis",
		schema: json!({
			"type": "object",
			"properties": {
				"intent": {
					"type": "string",
					"enum": ["create", "read", "update", "update_tag", "update_memory", "none"]
				}
			},
			"required": ["intent"]
		}),
	}
}

pub fn people_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "person_extraction",
		schema: json!({
			"type": "object",
			"properties": {
				"people": {
					"type": "array",
					"items": {
						"type": "object",
						"properties": {
							"name": { "type": "string" },
							"attributes": { "type": ["string", "null"] },
							"email": { "type": ["string", "null"] },
							"phone_number": { "type": ["string", "null"] }
						},
						"required": ["name"]
					}
				}
			},
			"required": ["people"]
		}),
	}
}

pub fn tag_assignments_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "tag_assignments",
		schema: json!({
			"type": "object",
			"properties": {
				"assignments": {
					"type": "array",
					"items": {
						"type": "object",
						"properties": {
							"people_names": { "type": "array", "items": { "type": "string" } },
							"tag_name": { "type": "string" },
							"operation": { "type": "string", "enum": ["add"] }
						},
						"required": ["people_names", "tag_name"]
					}
				}
			},
			"required": ["assignments"]
		}),
	}
}

pub fn memory_entries_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "memory_entries",
		schema: json!({
			"type": "object",
			"properties": {
				"entries": {
					"type": "array",
					"items": {
						"type": "object",
						"properties": {
							"person_name": { "type": "string" },
							"entry_content": { "type": "string" },
							"date": { "type": ["string", "null"] }
						},
						"required": ["person_name", "entry_content"]
					}
				}
			},
			"required": ["entries"]
		}),
	}
}

pub fn workflow_intent_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "intent_detection",
		schema: json!({
			"type": "object",
			"properties": {
				"action": { "type": "string", "enum": ["search", "create", "update"] },
				"confidence": { "type": "number", "minimum": 0, "maximum": 1 }
			},
			"required": ["action", "confidence"]
		}),
	}
}

pub fn workflow_identify_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "person_identification",
		schema: json!({
			"type": "object",
			"properties": {
				"action": {
					"type": "string",
					"enum": ["search", "create", "update", "clarify"]
				},
				"matched_ids": { "type": "array", "items": { "type": "string" } },
				"confidence": {
					"type": "string",
					"enum": ["certain", "uncertain", "no_matches", "multiple_matches"]
				},
				"reasoning": { "type": "string" },
				"needs_clarification": { "type": "boolean" }
			},
			"required": ["action", "matched_ids", "confidence", "reasoning", "needs_clarification"]
		}),
	}
}

pub fn workflow_create_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "create_person_data",
		schema: json!({
			"type": "object",
			"properties": {
				"name": { "type": "string" },
				"notes": { "type": ["string", "null"] },
				"email": { "type": ["string", "null"] },
				"phone_number": { "type": ["string", "null"] }
			},
			"required": ["name"]
		}),
	}
}

pub fn workflow_update_schema() -> SchemaDescriptor {
	SchemaDescriptor {
		name: "update_person_data",
		schema: json!({
			"type": "object",
			"properties": {
				"person_id": { "type": "string" },
				"notes": { "type": ["string", "null"] },
				"email": { "type": ["string", "null"] },
				"phone_number": { "type": ["string", "null"] }
			},
			"required": ["person_id"]
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn render_substitutes_narrative() {
		let prompt = render(INTENT_DETECTION_PROMPT, "I met Sarah today");

		assert!(prompt.contains("\"I met Sarah today\""));
		assert!(!prompt.contains("{narrative}"));
	}

	#[test]
	fn schemas_are_objects() {
		for descriptor in [
			intent_schema(),
			people_schema(),
			tag_assignments_schema(),
			memory_entries_schema(),
			workflow_intent_schema(),
			workflow_identify_schema(),
			workflow_create_schema(),
			workflow_update_schema(),
		] {
			assert!(descriptor.schema.is_object(), "{}", descriptor.name);
		}
	}
}
