use axum::{
    Json, Router,
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, header::LOCATION, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use popsicle_core::{InventoryError, Popsicle, PopsicleId};

use crate::error::{ApiError, ProblemDetails};
use crate::state::ApiState;

pub const UNKNOWN_ERROR_TITLE: &str = "An unknown error";

/// Inventory endpoints, mounted under the configured base path.
pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(list_popsicles).post(create_popsicle))
        .route("/search", get(search_without_term))
        .route("/search/{term}", get(search_popsicles))
        .route(
            "/{id}",
            get(get_popsicle).put(update_popsicle).delete(delete_popsicle),
        )
}

/// Integer record id from the path; anything else is treated as an
/// unmatched route and answers 404.
pub struct RecordId(pub PopsicleId);

impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<PopsicleId>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| RecordId(id))
            .map_err(|_| ApiError::NotFound)
    }
}

async fn create_popsicle(State(state): State<ApiState>, body: Bytes) -> Result<Response, ApiError> {
    let popsicle = parse_body(&body)?;
    let created = state.inventory.create_popsicle(popsicle)?;
    let location = state.location_of(created.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(created)).into_response())
}

async fn list_popsicles(State(state): State<ApiState>) -> Result<Json<Vec<Popsicle>>, ApiError> {
    Ok(Json(state.inventory.list_popsicles()?))
}

async fn get_popsicle(
    State(state): State<ApiState>,
    RecordId(id): RecordId,
) -> Result<Json<Popsicle>, ApiError> {
    Ok(Json(state.inventory.get_popsicle(id)?))
}

async fn search_popsicles(
    State(state): State<ApiState>,
    Path(term): Path<String>,
) -> Result<Json<Vec<Popsicle>>, ApiError> {
    Ok(Json(state.inventory.search_popsicles(&term)?))
}

async fn search_without_term() -> ApiError {
    ApiError::from(InventoryError::EmptySearchTerm)
}

async fn update_popsicle(
    State(state): State<ApiState>,
    RecordId(id): RecordId,
    body: Bytes,
) -> Result<Json<Popsicle>, ApiError> {
    let popsicle = parse_body(&body)?;
    Ok(Json(state.inventory.update_popsicle(id, popsicle)?))
}

async fn delete_popsicle(
    State(state): State<ApiState>,
    RecordId(id): RecordId,
) -> Result<StatusCode, ApiError> {
    state.inventory.delete_popsicle(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback error endpoint; nothing upstream forwards an error into it.
pub async fn error_route() -> ProblemDetails {
    ProblemDetails::new(StatusCode::INTERNAL_SERVER_ERROR, UNKNOWN_ERROR_TITLE)
}

/// Decodes an optional JSON record; an empty or `null` body yields `None`.
fn parse_body(body: &Bytes) -> Result<Option<Popsicle>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<Popsicle>>(body)
        .map_err(|err| ApiError::BadRequest(format!("Malformed popsicle JSON: {err}")))
}
