//! Error handling

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::{error, info, warn};

/// Message shown when the model answers without an image.
pub const NO_IMAGE_MESSAGE: &str = "The AI did not generate a valid image. Try with another style.";

/// Error definitions for the roster moment application.
#[derive(Debug)]
pub enum RosterError {
    /// When you didn't do the right thing
    BadRequest(String),
    /// Missing or wrong admin token
    Unauthorized,
    /// A credential or setting needed for the operation is missing
    Configuration(String),
    /// Input that could not be parsed, eg a broken data URI
    MalformedInput(String),
    /// The model answered, but without any inline image data
    NoImageProduced,
    /// Network or HTTP failure talking to the model or the email provider
    Upstream(String),
    /// Writing an artifact to disk failed
    Persistence(String),
    /// When DB operations fail
    DatabaseError(sea_orm::DbErr),
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            RosterError::Unauthorized => write!(f, "Unauthorized"),
            RosterError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            RosterError::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            RosterError::NoImageProduced => {
                write!(f, "Missing inlineData: the model response carried no image data")
            }
            RosterError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            RosterError::Persistence(msg) => write!(f, "Failed to store image: {msg}"),
            RosterError::DatabaseError(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl std::error::Error for RosterError {}

impl From<sea_orm::DbErr> for RosterError {
    fn from(err: sea_orm::DbErr) -> Self {
        RosterError::DatabaseError(err)
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        RosterError::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for RosterError {
    fn from(err: reqwest::Error) -> Self {
        RosterError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        RosterError::Upstream(format!("unparseable response: {err}"))
    }
}

impl From<base64::DecodeError> for RosterError {
    fn from(err: base64::DecodeError) -> Self {
        RosterError::MalformedInput(err.to_string())
    }
}

impl From<url::ParseError> for RosterError {
    fn from(err: url::ParseError) -> Self {
        RosterError::Configuration(err.to_string())
    }
}

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct FailureBody {
    /// Always false
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// Error detail
    pub error: String,
}

impl FailureBody {
    fn new(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: error.into(),
        }
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            RosterError::BadRequest(msg) => {
                info!("Bad request received: {msg}");
                (
                    StatusCode::BAD_REQUEST,
                    FailureBody::new("Invalid request", msg.clone()),
                )
            }
            RosterError::Unauthorized => {
                info!("Unauthorized request received");
                (
                    StatusCode::UNAUTHORIZED,
                    FailureBody::new("Unauthorized", "invalid or missing token"),
                )
            }
            RosterError::NoImageProduced => {
                warn!("No inlineData found in model response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    FailureBody::new(NO_IMAGE_MESSAGE, self.to_string()),
                )
            }
            RosterError::DatabaseError(err) => {
                error!("Database error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    FailureBody::new("Database error", err.to_string()),
                )
            }
            other => {
                error!("Error generating image: {other:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    FailureBody::new("Error generating image", other.to_string()),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
