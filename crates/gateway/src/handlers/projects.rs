//! Category listing handlers

use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use docportal_common::errors::Result;
use docportal_common::{AppError, Category};

/// `GET /v2/projects/{category}`: all documents in a category, sorted by
/// project id.
pub async fn list_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<serde_json::Value>>> {
    let category = Category::from_code(&category).ok_or_else(|| AppError::NotFound {
        resource_type: "category".to_string(),
        id: category.clone(),
    })?;

    let documents = state.repo.get_all_raw(category).await?;
    Ok(Json(documents))
}
