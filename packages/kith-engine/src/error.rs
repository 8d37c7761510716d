pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Validation failed: {message}")]
	Validation { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}

impl From<kith_providers::Error> for Error {
	fn from(err: kith_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<kith_domain::ValidationError> for Error {
	fn from(err: kith_domain::ValidationError) -> Self {
		Self::Validation { message: err.to_string() }
	}
}
