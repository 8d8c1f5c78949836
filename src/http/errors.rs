use crate::{NoteError, NoteValidationError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

/// An error ready to be sent back as a plain text response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!("Request failed: {detail:#}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<NoteError> for ApiError {
    fn from(e: NoteError) -> Self {
        match e {
            NoteError::Validation(NoteValidationError::NoteNotFound(_)) => {
                Self::new(StatusCode::NOT_FOUND, "Note not found")
            }
            NoteError::Validation(NoteValidationError::AlreadyExists(_)) => {
                Self::bad_request("Note already exists")
            }
            NoteError::Validation(NoteValidationError::InvalidInput) => {
                Self::bad_request("Invalid input")
            }
            NoteError::Validation(e @ NoteValidationError::UnsafeName(_)) => {
                Self::bad_request(e.to_string())
            }
            other => Self::internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
