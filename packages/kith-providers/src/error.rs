pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Retry class of a generation failure, computed once where the failure
/// surfaces instead of re-sniffed from error text by every caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	RateLimited,
	TransientServer,
	InvalidResponse,
	Fatal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Generation rate limited: {message}")]
	RateLimited { message: String },
	#[error("Generation transient server failure: {message}")]
	TransientServer { message: String },
	#[error("Generation returned an invalid response: {message}")]
	InvalidResponse { message: String },
	#[error("Generation request failed: {message}")]
	Request { message: String },
	#[error("Failed after {attempts} attempts. Last error: {last}")]
	RetriesExhausted { attempts: u32, last: String },
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::RateLimited { .. } => ErrorKind::RateLimited,
			Self::TransientServer { .. } => ErrorKind::TransientServer,
			Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
			Self::Reqwest(err) if err.is_timeout() || err.is_connect() =>
				ErrorKind::TransientServer,
			_ => ErrorKind::Fatal,
		}
	}
}

/// Classify an HTTP failure into a retry class.
pub fn from_http(status: u16, body: &str) -> Error {
	match status {
		429 => Error::RateLimited { message: format!("HTTP {status}: {body}") },
		500 | 503 => Error::TransientServer { message: format!("HTTP {status}: {body}") },
		_ => match classify_text(body) {
			ErrorKind::RateLimited =>
				Error::RateLimited { message: format!("HTTP {status}: {body}") },
			ErrorKind::TransientServer =>
				Error::TransientServer { message: format!("HTTP {status}: {body}") },
			_ => Error::Request { message: format!("HTTP {status}: {body}") },
		},
	}
}

/// Fallback classifier for providers that only surface codes inside free
/// text, e.g. "429 RESOURCE_EXHAUSTED" wrapped in a generic error.
pub fn classify_text(message: &str) -> ErrorKind {
	let lower = message.to_lowercase();

	if lower.contains("429") || lower.contains("quota") || lower.contains("rate limit") {
		return ErrorKind::RateLimited;
	}
	if lower.contains("500") || lower.contains("503") || lower.contains("server error") {
		return ErrorKind::TransientServer;
	}

	ErrorKind::Fatal
}
