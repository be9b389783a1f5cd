use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use log::{error, warn};
use popsicle_core::{InventoryError, ValidationErrors};
use serde::Serialize;
use thiserror::Error;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Handler error, one variant per HTTP status family.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// Body text repeats the underlying message; see DESIGN.md.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::MissingBody
            | InventoryError::InvalidUpdate { .. }
            | InventoryError::EmptySearchTerm => ApiError::BadRequest(err.to_string()),
            InventoryError::Validation(errors) => ApiError::Validation(errors),
            InventoryError::NotFound(_) | InventoryError::NoMatches(_) => ApiError::NotFound,
            InventoryError::AlreadyExists(_) => ApiError::Conflict(err.to_string()),
            InventoryError::Repo(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::Validation(errors) => {
                warn!(
                    "event=http_error module=api status={} kind=validation failures={}",
                    status.as_u16(),
                    errors.failures().len()
                );
                (status, Json(errors)).into_response()
            }
            ApiError::NotFound => status.into_response(),
            ApiError::Internal(_) => {
                error!(
                    "event=http_error module=api status={} kind=internal error={}",
                    status.as_u16(),
                    self
                );
                (status, self.to_string()).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}

/// RFC 9110 section links used as the problem `type`, keyed by status.
const PROBLEM_TYPES: &[(StatusCode, &str)] = &[
    (
        StatusCode::BAD_REQUEST,
        "https://tools.ietf.org/html/rfc9110#section-15.5.1",
    ),
    (
        StatusCode::NOT_FOUND,
        "https://tools.ietf.org/html/rfc9110#section-15.5.5",
    ),
    (
        StatusCode::CONFLICT,
        "https://tools.ietf.org/html/rfc9110#section-15.5.10",
    ),
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "https://tools.ietf.org/html/rfc9110#section-15.6.1",
    ),
];

/// Problem `type` for `status`; `about:blank` when no section is mapped.
pub fn problem_type_for(status: StatusCode) -> &'static str {
    PROBLEM_TYPES
        .iter()
        .find(|(code, _)| *code == status)
        .map_or("about:blank", |&(_, uri)| uri)
}

/// RFC 7807 problem document.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            kind: problem_type_for(status),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(CONTENT_TYPE, PROBLEM_CONTENT_TYPE)], Json(self)).into_response()
    }
}
