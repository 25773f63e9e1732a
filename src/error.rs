use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Data not found: {0}")]
    DataNotFound(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Model not built: {0}")]
    ModelNotBuilt(String),

    #[error("Index {index} out of range for corpus of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No usable attribute tokens supplied")]
    EmptyInput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            AppError::EmptyInput | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ModelNotBuilt(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DataNotFound(_)
            | AppError::Schema(_)
            | AppError::Csv(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
