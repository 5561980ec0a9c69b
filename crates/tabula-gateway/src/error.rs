// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handler failures and their `{error}` JSON bodies.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tabula_model::SourceError;
use tabula_store::{StoreError, StoreErrorKind};
use thiserror::Error;
use tracing::{error, warn};

/// Why a request did not succeed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed parameters. Nothing reached the store.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Lookup found nothing.
    #[error("not found: {0}")]
    NotFound(String),
    /// The store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(err) if matches!(err.kind, StoreErrorKind::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Body text; store failures use their short summary.
    fn message(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) => message.clone(),
            Self::Store(err) => err.summary(),
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Store(err) => error!(?err, table = %err.table, op = %err.op, "store call failed"),
            other => warn!(status = status.as_u16(), error = %other.message(), "request rejected"),
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;
    use tabula_store::StoreOp;

    #[test]
    fn store_failures_keep_their_context_in_display() {
        let err: ApiError = StoreError::not_found(StoreOp::Update, "p1.t2").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Record not found");
        assert_eq!(
            err.to_string(),
            StoreError::not_found(StoreOp::Update, "p1.t2").to_string()
        );
    }

    #[test]
    fn backend_validation_is_a_client_error() {
        let err: ApiError =
            StoreError::invalid(StoreOp::Create, "p1.t2", "Name is required").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Name is required");

        let err = ApiError::BadRequest("Source parameter is required".into());
        assert_eq!(err.to_string(), "bad request: Source parameter is required");
        assert_eq!(err.message(), "Source parameter is required");
    }
}
