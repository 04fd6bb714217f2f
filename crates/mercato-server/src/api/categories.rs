use axum::{extract::State, Extension, Json};
use serde::Serialize;

use mercato_core::Category;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CategoryList {
    categories: Vec<Category>,
}

/// GET /api/v1/categories — every category, for filter UIs.
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<CategoryList>, ApiError> {
    let categories = mercato_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    Ok(Json(CategoryList { categories }))
}
