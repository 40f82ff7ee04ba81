use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::predict::PredictError;
use crate::tle::FetchError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required parameters")]
    MissingParameter,
    #[error("Invalid coordinates")]
    InvalidCoordinates,
    #[error("Error parsing TLE data")]
    InvalidTle(String),
    #[error("Failed to calculate passes")]
    Calculation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter | ApiError::InvalidCoordinates | ApiError::InvalidTle(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Calculation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Cause reported to clients; only set for internal failures
    pub fn details(&self) -> Option<&str> {
        match self {
            ApiError::Calculation(details) => Some(details.as_str()),
            _ => None,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Calculation(e.to_string())
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::PropagationInit(msg) => ApiError::InvalidTle(msg),
            PredictError::PropagationSample(msg) => ApiError::Calculation(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            details: self.details().map(String::from),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
