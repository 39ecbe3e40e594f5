use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::MessageResponse;
use crate::validation::ValidationError;

pub const VALIDATION_ERROR: &str = "Validation Error";
pub const CANNOT_CREATE: &str = "Cannot create todo";
pub const UNABLE_TO_UPDATE: &str = "Unable to update";
pub const UNABLE_TO_DELETE: &str = "Unable to delete";
pub const DATA_NOT_VALID: &str = "Data not valid";

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Failure of a todo operation
///
/// Every variant renders as `400 Bad Request` with a fixed `{ "message" }`
/// body. The underlying cause is logged but never sent to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed its validation profile
    Validation(ValidationError),
    /// Store failed while inserting
    CreateFailed(anyhow::Error),
    /// Store failed while updating, including an unknown id
    UpdateFailed(anyhow::Error),
    /// Store failed during the existence check or the delete itself
    DeleteFailed(anyhow::Error),
    /// Delete target does not exist
    DataNotValid(String),
}

impl ApiError {
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => VALIDATION_ERROR,
            ApiError::CreateFailed(_) => CANNOT_CREATE,
            ApiError::UpdateFailed(_) => UNABLE_TO_UPDATE,
            ApiError::DeleteFailed(_) => UNABLE_TO_DELETE,
            ApiError::DataNotValid(_) => DATA_NOT_VALID,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(err) => tracing::debug!("Rejected request body: {}", err),
            ApiError::CreateFailed(err) => tracing::warn!("Create failed: {:#}", err),
            ApiError::UpdateFailed(err) => tracing::warn!("Update failed: {:#}", err),
            ApiError::DeleteFailed(err) => tracing::warn!("Delete failed: {:#}", err),
            ApiError::DataNotValid(id) => tracing::info!("Delete target not found: {}", id),
        }

        let body = Json(MessageResponse::new(self.message()));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}
