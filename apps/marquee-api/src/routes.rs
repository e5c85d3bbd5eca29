use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::{
	state::AppState,
	webhook::{WebhookRequest, WebhookResponse},
};
use marquee_service::{EpgSearchRequest, EpgSearchResponse, Error};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/handler", post(handle_webhook))
		.route("/v1/epg/search", post(search_epg))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn handle_webhook(
	State(state): State<AppState>,
	Json(payload): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, ApiError> {
	let turn = payload.into_turn()?;
	let response = state.service.handle_turn(turn).await?;

	Ok(Json(WebhookResponse::from_turn(&response, &state.service.cfg.presentation)))
}

async fn search_epg(
	State(state): State<AppState>,
	Json(payload): Json<EpgSearchRequest>,
) -> Result<Json<EpgSearchResponse>, ApiError> {
	let response = state
		.service
		.search_epg(payload)
		.await
		.map_err(|err| ApiError::from(err).with_fields(&["$.query"]))?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}

	/// Points a client error at the request fields that caused it.
	fn with_fields(mut self, fields: &[&str]) -> Self {
		if self.status.is_client_error() {
			self.fields = Some(fields.iter().map(|field| field.to_string()).collect());
		}

		self
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::MalformedTurn { message } =>
				Self::new(StatusCode::BAD_REQUEST, "malformed_turn", message, None),
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			// Searches degrade to empty results inside the service, so these only surface if a
			// handler ever calls storage directly.
			Error::SearchUnavailable { message } | Error::Storage { message } => {
				tracing::error!(error = %message, "Request failed.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"Internal error.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
