//! Error types for payslip-portal-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use payslip_portal_core::{CoreError, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Bad request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => status_for(err),
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Core(err) => err.user_message(),
            ApiError::BadRequest { message } => message.clone(),
        }
    }
}

/// HTTP status for a core failure
pub fn status_for(err: &CoreError) -> StatusCode {
    match err.code() {
        ErrorCode::FetchFailure | ErrorCode::ActionFailure => StatusCode::BAD_GATEWAY,
        ErrorCode::InvalidSelection => StatusCode::BAD_REQUEST,
        ErrorCode::UnknownPayslip => StatusCode::NOT_FOUND,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotSupported => StatusCode::NOT_IMPLEMENTED,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Core(err) => serde_json::json!({
                "error": err.code(),
                "message": err.user_message(),
            }),
            ApiError::BadRequest { message } => serde_json::json!({
                "error": "BAD_REQUEST",
                "message": message,
            }),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
