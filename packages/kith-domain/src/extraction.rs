use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

pub type ValidationResult<T, E = ValidationError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("Name must be at least {NAME_MIN_CHARS} characters.")]
	NameTooShort,
	#[error("Name must be at most {NAME_MAX_CHARS} characters.")]
	NameTooLong,
	#[error("Phone number must contain at least one digit.")]
	PhoneWithoutDigits,
}

/// One person pulled out of a narrative. Construct through [`PersonExtraction::new`];
/// a record violating any field rule is rejected whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonExtractionWire")]
pub struct PersonExtraction {
	pub name: String,
	pub attributes: Option<String>,
	pub email: Option<String>,
	pub phone_number: Option<String>,
}

impl PersonExtraction {
	pub fn new(
		name: &str,
		attributes: Option<&str>,
		email: Option<&str>,
		phone_number: Option<&str>,
	) -> ValidationResult<Self> {
		let name = validate_person_name(name)?;
		let attributes = attributes.map(str::trim).filter(|v| !v.is_empty()).map(ToString::to_string);
		let email = email
			.map(|v| v.trim().to_lowercase())
			.filter(|v| !v.is_empty());
		let phone_number = match phone_number.map(str::trim).filter(|v| !v.is_empty()) {
			Some(raw) => {
				if !Regex::new(r"\d").map(|re| re.is_match(raw)).unwrap_or(false) {
					return Err(ValidationError::PhoneWithoutDigits);
				}

				Some(raw.to_string())
			},
			None => None,
		};

		Ok(Self { name, attributes, email, phone_number })
	}
}

/// Shared name rule, also applied to implicit person creation.
pub fn validate_person_name(name: &str) -> ValidationResult<String> {
	let trimmed = name.trim();
	let chars = trimmed.chars().count();

	if chars < NAME_MIN_CHARS {
		return Err(ValidationError::NameTooShort);
	}
	if chars > NAME_MAX_CHARS {
		return Err(ValidationError::NameTooLong);
	}

	Ok(trimmed.to_string())
}

#[derive(Deserialize)]
struct PersonExtractionWire {
	name: String,
	#[serde(default)]
	attributes: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	phone_number: Option<String>,
}

impl TryFrom<PersonExtractionWire> for PersonExtraction {
	type Error = ValidationError;

	fn try_from(wire: PersonExtractionWire) -> ValidationResult<Self> {
		Self::new(
			&wire.name,
			wire.attributes.as_deref(),
			wire.email.as_deref(),
			wire.phone_number.as_deref(),
		)
	}
}

/// Request to put a set of people under one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAssignment {
	pub people_names: Vec<String>,
	pub tag_name: String,
	#[serde(default = "default_operation")]
	pub operation: String,
}

/// Request to record what happened with one person on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUpdate {
	pub person_name: String,
	pub entry_content: String,
	/// Relative or absolute token, resolved by [`crate::dates::parse_relative_date`].
	#[serde(default)]
	pub date: Option<String>,
}

fn default_operation() -> String {
	"add".to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_single_character_name() {
		assert_eq!(
			PersonExtraction::new("A", None, None, None),
			Err(ValidationError::NameTooShort)
		);
	}

	#[test]
	fn rejects_overlong_name() {
		let name = "A".repeat(101);

		assert_eq!(
			PersonExtraction::new(&name, None, None, None),
			Err(ValidationError::NameTooLong)
		);
	}

	#[test]
	fn trims_name_before_length_check() {
		let person =
			PersonExtraction::new("  Tom  ", None, None, None).expect("name should be valid");

		assert_eq!(person.name, "Tom");
	}

	#[test]
	fn normalizes_email_to_lowercase() {
		let person = PersonExtraction::new("Tom", None, Some("Foo@BAR.com"), None)
			.expect("record should be valid");

		assert_eq!(person.email.as_deref(), Some("foo@bar.com"));
	}

	#[test]
	fn rejects_phone_without_digits() {
		assert_eq!(
			PersonExtraction::new("Tom", None, None, Some("no-digits")),
			Err(ValidationError::PhoneWithoutDigits)
		);
	}

	#[test]
	fn keeps_phone_formatting_as_given() {
		let person = PersonExtraction::new("Jane", None, None, Some("415-555-0123"))
			.expect("record should be valid");

		assert_eq!(person.phone_number.as_deref(), Some("415-555-0123"));
	}

	#[test]
	fn deserialization_applies_the_same_rules() {
		let err = serde_json::from_str::<PersonExtraction>(r#"{"name":"A"}"#)
			.expect_err("short name should fail");

		assert!(err.to_string().contains("at least 2"));
	}

	#[test]
	fn tag_assignment_defaults_to_add() {
		let assignment: TagAssignment =
			serde_json::from_str(r#"{"people_names":["Tom"],"tag_name":"Work"}"#)
				.expect("deserialize failed");

		assert_eq!(assignment.operation, "add");
	}
}
