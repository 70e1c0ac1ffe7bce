//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledger_core::ledger::LedgerError;
use ledger_shared::AppError;
use serde_json::json;

/// Error returned by handlers, rendered as `{"error": code, "message": text}`.
///
/// The status comes from the [`AppError`] category. The code is the most
/// specific one available, so ledger errors report e.g.
/// `INSUFFICIENT_BALANCE` rather than the generic category code.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    code: &'static str,
}

impl ApiError {
    /// Returns the HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if matches!(err, LedgerError::Store(_)) {
            tracing::error!(error = %err, "Store failure");
        }
        let code = err.error_code();
        Self {
            error: err.into(),
            code,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        let code = error.error_code();
        Self { error, code }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Store details stay in the logs.
        let message = if self.error.is_server_error() {
            "An error occurred"
        } else {
            self.error.message()
        };

        (
            self.status(),
            Json(json!({
                "error": self.code,
                "message": message,
            })),
        )
            .into_response()
    }
}
