use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The main error type for Pawgate.
///
/// Every verification failure is recovered at the request boundary and
/// returned as a 4xx JSON body; none of these propagate as panics.
#[derive(Debug, thiserror::Error)]
pub enum PawgateError {
    #[error("User not found")]
    UserNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Invalid 2FA code")]
    InvalidCode,

    #[error("2FA is not enabled for this account")]
    NotEnabled,

    #[error("OTP expired or not found")]
    OtpNotFound,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Failed to deliver email: {0}")]
    EmailDelivery(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON body returned for every error response.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl PawgateError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn email_delivery(msg: impl Into<String>) -> Self {
        Self::EmailDelivery(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::UserNotFound | Self::PaymentNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCode
            | Self::NotEnabled
            | Self::OtpNotFound
            | Self::OtpExpired
            | Self::InvalidOtp
            | Self::Validation(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::EmailDelivery(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for client responses.
    ///
    /// Client errors (4xx) expose their message; server errors return a
    /// generic message and keep the detail in the logs.
    fn safe_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            Self::EmailDelivery(_) => "Failed to deliver email".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for PawgateError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.safe_message(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for Pawgate operations.
pub type Result<T> = std::result::Result<T, PawgateError>;

impl From<serde_json::Error> for PawgateError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            PawgateError::BadRequest(format!("JSON error: {}", err))
        } else {
            PawgateError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<validator::ValidationErrors> for PawgateError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field_errors: Vec<String> = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.as_ref()))
                    .collect();
                if messages.is_empty() {
                    format!("{}: invalid", field)
                } else {
                    format!("{}: {}", field, messages.join(", "))
                }
            })
            .collect();

        PawgateError::Validation(field_errors.join("; "))
    }
}
