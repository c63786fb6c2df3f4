//! Dataset, preview and derived-data handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use refinery::dataset::ColumnInfo;
use refinery::{OutputMode, Preview, PreviewRequest, Previewer, Row, Value};
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Default number of derived rows returned.
const DEFAULT_DERIVED_ROWS: usize = 100;

#[derive(Serialize)]
pub struct DatasetInfo {
    pub id: String,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub transformations: usize,
}

/// Request body for previewing a candidate expression.
#[derive(Deserialize)]
pub struct PreviewBody {
    pub column: String,
    pub expression: String,
    /// Explicit sample values. When absent, rows come from the dataset.
    pub samples: Option<Vec<Value>>,
    /// Ignore the committed chain.
    #[serde(default)]
    pub standalone: bool,
    pub output: Option<OutputMode>,
}

#[derive(Deserialize)]
pub struct DerivedQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct DerivedResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub total_rows: usize,
    pub truncated: bool,
}

/// GET /api/datasets
pub async fn list_datasets(
    State(state): State<AppState>,
) -> Result<Json<Vec<DatasetInfo>>, ApiError> {
    let mut infos = Vec::with_capacity(state.datasets.len());
    for (id, workspace) in state.datasets.iter() {
        infos.push(DatasetInfo {
            id: id.clone(),
            row_count: workspace.dataset.row_count(),
            columns: workspace.dataset.columns.clone(),
            transformations: workspace.sequencer.list(id)?.len(),
        });
    }
    Ok(Json(infos))
}

/// POST /api/datasets/:dataset/preview
pub async fn preview_expression(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
    Json(body): Json<PreviewBody>,
) -> Result<Json<Preview>, ApiError> {
    let workspace = state.workspace(&dataset_id)?;
    let library = workspace.sequencer.library();

    let mut request = PreviewRequest::new(&body.column, &body.expression);
    if let Some(output) = body.output {
        request = request.with_output(output);
    }
    match body.samples {
        Some(samples) => request = request.with_samples(samples),
        None => {
            if !workspace.dataset.has_column(&body.column) {
                return Err(ApiError::BadRequest(format!(
                    "Column '{}' not found in dataset '{}'",
                    body.column, dataset_id
                )));
            }
            request = request.with_context(workspace.dataset.rows.clone());
        }
    }

    let previewer = Previewer::with_library(library.clone());
    let preview = if body.standalone {
        previewer.preview(&request)
    } else {
        let chain = workspace.sequencer.pipeline(&dataset_id, &body.column)?;
        previewer.preview_on_chain(&chain, &request)
    };
    Ok(Json(preview))
}

/// GET /api/datasets/:dataset/derived?limit=n
pub async fn derived_rows(
    State(state): State<AppState>,
    Path(dataset_id): Path<String>,
    Query(query): Query<DerivedQuery>,
) -> Result<Json<DerivedResponse>, ApiError> {
    let workspace = state.workspace(&dataset_id)?;
    let limit = query.limit.unwrap_or(DEFAULT_DERIVED_ROWS);

    let rows = workspace.sequencer.apply_dataset(&workspace.dataset)?;
    let total_rows = rows.len();

    let mut columns: Vec<String> = workspace
        .dataset
        .column_names()
        .iter()
        .map(|c| c.to_string())
        .collect();
    for row in &rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    Ok(Json(DerivedResponse {
        columns,
        rows: rows.into_iter().take(limit).collect(),
        total_rows,
        truncated: total_rows > limit,
    }))
}
