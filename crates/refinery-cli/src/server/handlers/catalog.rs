//! Function catalog handler.

use axum::Json;
use refinery::FunctionSpec;
use refinery::functions::catalog;

/// GET /api/functions
pub async fn list_functions() -> Json<&'static [FunctionSpec]> {
    Json(catalog())
}
