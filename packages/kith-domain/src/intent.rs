use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeStruct};

/// Closed set of actions a narrative can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	Create,
	Read,
	Update,
	UpdateTag,
	UpdateMemory,
	None,
}

/// Classifier output. `is_create_request` is derived from `intent`; the
/// value a model returns for it is discarded on deserialization so the two
/// can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentAnalysis {
	pub intent: Intent,
}

impl IntentAnalysis {
	pub fn new(intent: Intent) -> Self {
		Self { intent }
	}

	pub fn is_create_request(&self) -> bool {
		self.intent == Intent::Create
	}
}

#[derive(Deserialize)]
struct IntentAnalysisWire {
	intent: Intent,
	#[serde(default, rename = "is_create_request")]
	_is_create_request: Option<bool>,
}

impl<'de> Deserialize<'de> for IntentAnalysis {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let wire = IntentAnalysisWire::deserialize(deserializer)?;

		Ok(Self { intent: wire.intent })
	}
}

impl Serialize for IntentAnalysis {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut state = serializer.serialize_struct("IntentAnalysis", 2)?;

		state.serialize_field("intent", &self.intent)?;
		state.serialize_field("is_create_request", &self.is_create_request())?;
		state.end()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn intent_uses_snake_case_labels() {
		let json = serde_json::to_string(&Intent::UpdateTag).expect("serialize failed");

		assert_eq!(json, "\"update_tag\"");
	}

	#[test]
	fn is_create_request_is_derived_from_intent() {
		for (intent, expected) in [
			(Intent::Create, true),
			(Intent::Read, false),
			(Intent::Update, false),
			(Intent::UpdateTag, false),
			(Intent::UpdateMemory, false),
			(Intent::None, false),
		] {
			assert_eq!(IntentAnalysis::new(intent).is_create_request(), expected);
		}
	}

	#[test]
	fn deserialization_ignores_reported_flag() {
		let analysis: IntentAnalysis =
			serde_json::from_str(r#"{"intent":"read","is_create_request":true}"#)
				.expect("deserialize failed");

		assert_eq!(analysis.intent, Intent::Read);
		assert!(!analysis.is_create_request());
	}

	#[test]
	fn serialization_emits_derived_flag() {
		let json =
			serde_json::to_value(IntentAnalysis::new(Intent::Create)).expect("serialize failed");

		assert_eq!(json["intent"], "create");
		assert_eq!(json["is_create_request"], true);
	}
}
