//! HTTP error mapping for API handlers.
//!
//! Every response body, success or failure, is a [`PatchResult`]; the status
//! code carries the error class.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use liveedit_core::{ActionOutcome, AppError, ErrorClass, PatchResult};

/// Status code for a failed action of the given class.
pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorClass::MarkerNotFound => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorClass::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorClass::Remote => StatusCode::BAD_GATEWAY,
        ErrorClass::ConfigurationMissing => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Handler failure rendered as a `PatchResult` body.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    result: PatchResult,
}

impl HttpError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            result: PatchResult::failure(error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        let status = status_for(err.class());
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        Self {
            status,
            result: PatchResult::from_error(&err),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.result)).into_response()
    }
}

/// Response wrapper for an [`ActionOutcome`].
pub struct ActionResponse(pub ActionOutcome);

impl IntoResponse for ActionResponse {
    fn into_response(self) -> Response {
        let status = self.0.class.map(status_for).unwrap_or(StatusCode::OK);
        (status, Json(self.0.result)).into_response()
    }
}
