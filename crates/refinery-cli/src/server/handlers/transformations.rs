//! Transformation lifecycle handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use refinery::{
    DeleteMode, NewTransformation, OutputMode, Transformation, TransformationStatus,
    TransformationUpdate,
};
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for creating a transformation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub column: String,
    pub expression: String,
    pub status: Option<TransformationStatus>,
    pub output: Option<OutputMode>,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard: bool,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct CleanupResponse {
    pub deleted: usize,
}

/// GET /api/datasets/:dataset/transformations
pub async fn list_transformations(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
) -> Result<Json<Vec<Transformation>>, ApiError> {
    let workspace = state.workspace(&dataset_id)?;
    Ok(Json(workspace.sequencer.list(&dataset_id)?))
}

/// POST /api/datasets/:dataset/transformations
pub async fn create_transformation(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Transformation>), ApiError> {
    let workspace = state.workspace(&dataset_id)?;
    if !workspace.dataset.has_column(&req.column) {
        return Err(ApiError::BadRequest(format!(
            "Column '{}' not found in dataset '{}'",
            req.column, dataset_id
        )));
    }

    let mut request = NewTransformation::new(&dataset_id, &req.column, &req.expression);
    request.status = req.status;
    request.output = req.output;

    let created = workspace.sequencer.create(request)?;
    workspace.save()?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/transformations/:id
pub async fn update_transformation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<TransformationUpdate>,
) -> Result<Json<Transformation>, ApiError> {
    let workspace = state.owner_of(&id)?;
    let updated = workspace.sequencer.update(&id, update)?;
    workspace.save()?;
    Ok(Json(updated))
}

/// DELETE /api/transformations/:id?hard=bool
pub async fn delete_transformation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Transformation>, ApiError> {
    let workspace = state.owner_of(&id)?;
    let mode = if query.hard { DeleteMode::Hard } else { DeleteMode::Soft };
    let removed = workspace.sequencer.delete(&id, mode)?;
    workspace.save()?;
    Ok(Json(removed))
}

/// POST /api/datasets/:dataset/columns/:column/reorder
pub async fn reorder_column(
    State(state): State<AppState>,
    Path((dataset_id, column)): Path<(String, String)>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<Transformation>>, ApiError> {
    let workspace = state.workspace(&dataset_id)?;
    let chain = workspace.sequencer.reorder(&dataset_id, &column, &req.ids)?;
    workspace.save()?;
    Ok(Json(chain))
}

/// POST /api/datasets/:dataset/cleanup
pub async fn cleanup_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let workspace = state.workspace(&dataset_id)?;
    let deleted = workspace.sequencer.cleanup(&dataset_id)?;
    if deleted > 0 {
        workspace.save()?;
    }
    Ok(Json(CleanupResponse { deleted }))
}
