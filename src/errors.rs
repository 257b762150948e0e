use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::not_found(format!("task {id} not found")),
            other => Self::internal(other),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(_) | TaskError::SubtaskNotFound(_) => Self::not_found(err.to_string()),
            TaskError::BlankText | TaskError::InvalidDate(_) | TaskError::InvalidFrequency(_) => {
                Self::bad_request(err.to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(String),

    #[error("failed to write store file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode store data: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("analyzer returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analyzer response was not understood: {0}")]
    Parse(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task text must not be empty")]
    BlankText,

    #[error("scheduled date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),

    #[error("frequency must be a positive integer, got {0}")]
    InvalidFrequency(String),

    #[error("task {0} not found")]
    NotFound(String),

    #[error("subtask {0} not found")]
    SubtaskNotFound(String),
}
