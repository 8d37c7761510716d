use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};

use kith_engine::{
	ConfirmMemoryRequest, ConfirmMemoryResponse, ConfirmPersonRequest, ConfirmPersonResponse,
	ConfirmTagRequest, ConfirmTagResponse, Error as EngineError, ExtractionResponse,
	ResolveRequest, WorkflowRequest, WorkflowResult,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/ai/extract-people", post(extract_people))
		.route("/v1/ai/chat", post(chat))
		.route("/v1/ai/route", post(route_stream))
		.route("/v1/ai/confirm-person", post(confirm_person))
		.route("/v1/ai/confirm-tag", post(confirm_tag))
		.route("/v1/ai/confirm-memory", post(confirm_memory))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn extract_people(
	State(state): State<AppState>,
	Json(payload): Json<ResolveRequest>,
) -> Result<Json<ExtractionResponse>, ApiError> {
	let response = state.engine.resolve(payload).await?;
	Ok(Json(response))
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<WorkflowRequest>,
) -> Json<WorkflowResult> {
	Json(state.engine.invoke(payload).await)
}

/// Streams workflow events as SSE. The engine writes into a bounded
/// channel; a client that disconnects drops the receiver, which the
/// engine observes as cancellation.
async fn route_stream(
	State(state): State<AppState>,
	Json(payload): Json<WorkflowRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	let (tx, rx) = mpsc::channel(16);
	let engine = state.engine.clone();

	tokio::spawn(async move {
		engine.stream(payload, tx).await;
	});

	let stream = ReceiverStream::new(rx).map(|event| {
		Ok(Event::default().json_data(&event).unwrap_or_else(|_| Event::default().data("{}")))
	});

	Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn confirm_person(
	State(state): State<AppState>,
	Json(payload): Json<ConfirmPersonRequest>,
) -> Result<Json<ConfirmPersonResponse>, ApiError> {
	let response = state.engine.confirm_person(payload).await?;
	Ok(Json(response))
}

async fn confirm_tag(
	State(state): State<AppState>,
	Json(payload): Json<ConfirmTagRequest>,
) -> Result<Json<ConfirmTagResponse>, ApiError> {
	let response = state.engine.confirm_tag_assignment(payload).await?;
	Ok(Json(response))
}

async fn confirm_memory(
	State(state): State<AppState>,
	Json(payload): Json<ConfirmMemoryRequest>,
) -> Result<Json<ConfirmMemoryResponse>, ApiError> {
	let response = state.engine.confirm_memory_entry(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<EngineError> for ApiError {
	fn from(err: EngineError) -> Self {
		let (status, error_code) = match &err {
			EngineError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			EngineError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_failed"),
			EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			EngineError::Provider { .. } | EngineError::Storage { .. } =>
				(StatusCode::INTERNAL_SERVER_ERROR, "internal"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };
		(self.status, Json(body)).into_response()
	}
}
