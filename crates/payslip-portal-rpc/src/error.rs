//! Error types for payslip-portal-rpc

use payslip_portal_core::CoreError;
use std::sync::Arc;
use thiserror::Error;

/// Server error code the backend uses for an expired or missing session
pub const SESSION_EXPIRED_CODE: i64 = 100;

#[derive(Error, Debug, Clone)]
pub enum RpcError {
    #[error("failed to send http request: {0}")]
    Http(Arc<reqwest::Error>),

    #[error("failed to parse json: {0}")]
    Json(Arc<serde_json::Error>),

    #[error("server error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

impl RpcError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, RpcError::Server { code, .. } if *code == SESSION_EXPIRED_CODE)
    }

    /// As a failed read of `model`
    pub fn into_fetch(self, model: &str) -> CoreError {
        CoreError::fetch(model, self.to_string())
    }

    /// As a failed document action
    pub fn into_action(self) -> CoreError {
        CoreError::action(self.to_string())
    }
}

pub type RpcResult<T> = Result<T, RpcError>;
