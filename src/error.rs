use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use thiserror::Error;

use crate::llm::LlmError;
use crate::models::chat::ErrorBody;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No messages provided")]
    EmptyMessages,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Generation(#[from] LlmError),
}

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::EmptyMessages | ChatError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ChatError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}
