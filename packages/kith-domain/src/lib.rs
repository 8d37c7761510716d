pub mod dates;
pub mod extraction;
pub mod intent;
pub mod matching;
pub mod records;
pub mod response;

pub use extraction::{
	MemoryUpdate, PersonExtraction, TagAssignment, ValidationError, ValidationResult,
	validate_person_name,
};
pub use intent::{Intent, IntentAnalysis};
pub use matching::{
	DuplicateWarning, MemoryUpdateMatch, PersonMatch, PersonMatchResult, SIMILARITY_EXACT,
	SIMILARITY_PARTIAL, TagAssignmentMatch,
};
pub use records::{MemoryEntryRecord, PersonRecord, TagRecord};
pub use response::ExtractionResponse;
